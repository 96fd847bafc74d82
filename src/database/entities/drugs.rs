use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::Drug;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "drugs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub generic_name: String,
    pub brand_name: String,
    pub company: String,
    pub launch_date: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Drug {
    fn from(model: Model) -> Self {
        Drug {
            id: model.id,
            code: model.code,
            generic_name: model.generic_name,
            brand_name: model.brand_name,
            company: model.company,
            launch_date: model.launch_date,
        }
    }
}
