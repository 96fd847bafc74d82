//! Static description of how the drug table is rendered

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{SortDirection, SortField};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Date,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub visible: bool,
    /// Display width in pixels
    pub width: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub clickable: bool,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDefaults {
    pub default_page_size: u64,
    pub page_size_options: Vec<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SortingDefaults {
    pub default_field: SortField,
    pub default_direction: SortDirection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    pub columns: Vec<ColumnConfig>,
    pub pagination: PaginationDefaults,
    pub sorting: SortingDefaults,
}

impl TableConfig {
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnConfig> {
        self.columns.iter().filter(|c| c.visible)
    }

    pub fn column(&self, key: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|c| c.key == key)
    }
}

/// Keys a column may refer to: stored drug fields plus the derived ones
pub const COLUMN_KEYS: [&str; 8] = [
    "id",
    "code",
    "genericName",
    "brandName",
    "company",
    "launchDate",
    "displayName",
    "sequentialId",
];

fn column(key: &str, label: &str, sortable: bool, width: u32, column_type: ColumnType) -> ColumnConfig {
    ColumnConfig {
        key: key.to_string(),
        label: label.to_string(),
        sortable,
        visible: true,
        width,
        clickable: false,
        column_type: Some(column_type),
    }
}

pub fn table_config() -> TableConfig {
    let mut generic_name = column("genericName", "Generic Name", true, 200, ColumnType::String);
    generic_name.visible = false;
    let mut brand_name = column("brandName", "Brand Name", true, 200, ColumnType::String);
    brand_name.visible = false;
    let mut company = column("company", "Company", true, 200, ColumnType::String);
    company.clickable = true;

    TableConfig {
        columns: vec![
            column("sequentialId", "#", false, 60, ColumnType::Number),
            column("code", "Code", true, 120, ColumnType::String),
            column("displayName", "Drug", false, 320, ColumnType::String),
            generic_name,
            brand_name,
            company,
            column("launchDate", "Launch Date", true, 140, ColumnType::Date),
        ],
        pagination: PaginationDefaults {
            default_page_size: 50,
            page_size_options: vec![10, 25, 50, 100],
        },
        sorting: SortingDefaults {
            default_field: SortField::LaunchDate,
            default_direction: SortDirection::Desc,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_keys_name_drug_fields() {
        let config = table_config();
        for column in &config.columns {
            assert!(COLUMN_KEYS.contains(&column.key.as_str()), "{}", column.key);
        }
    }

    #[test]
    fn sortable_columns_are_sort_fields() {
        let config = table_config();
        for column in config.columns.iter().filter(|c| c.sortable) {
            assert!(column.key.parse::<SortField>().is_ok(), "{}", column.key);
        }
        let default_key = config.sorting.default_field.as_str();
        assert!(config.column(default_key).map(|c| c.sortable).unwrap_or(false));
    }

    #[test]
    fn default_page_size_is_an_option() {
        let config = table_config();
        assert!(config
            .pagination
            .page_size_options
            .contains(&config.pagination.default_page_size));
    }

    #[test]
    fn serializes_wire_shape() {
        let json = serde_json::to_value(table_config()).unwrap();
        assert_eq!(json["sorting"]["defaultField"], "launchDate");
        assert_eq!(json["sorting"]["defaultDirection"], "desc");
        assert_eq!(json["pagination"]["defaultPageSize"], 50);

        let company = json["columns"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["key"] == "company")
            .unwrap();
        assert_eq!(company["clickable"], true);

        let code = json["columns"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["key"] == "code")
            .unwrap();
        assert!(code.get("clickable").is_none());
        assert_eq!(code["type"], "string");
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(table_config(), table_config());
        assert_eq!(table_config().visible_columns().count(), 5);
    }
}
