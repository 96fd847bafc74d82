use std::str::FromStr;

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::api::{ApiClient, ClientResult, DrugApi};
use super::controller::TableController;
use super::render::render;
use crate::config::ClientConfig;
use crate::model::{SortDirection, SortField};

const HELP: &str = "\
Commands:
  n                 next page
  p                 previous page
  g <page>          go to page
  c <company>       filter by company
  c                 clear the company filter
  f <#>             filter by the company in row #
  s <field> [dir]   sort by field (asc|desc)
  z <size>          change page size
  l                 list companies
  r                 reload the current page
  d                 dismiss the error banner
  h                 show this help
  q                 quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Prev,
    Page(u64),
    Company(String),
    ClearCompany,
    FilterRow(u64),
    Sort(SortField, SortDirection),
    PageSize(u64),
    ListCompanies,
    Refresh,
    Dismiss,
    Help,
    Quit,
}

impl FromStr for BrowseCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let number = |what: &str| {
            rest.parse::<u64>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| format!("{} must be a positive integer", what))
        };

        match head {
            "n" => Ok(Self::Next),
            "p" => Ok(Self::Prev),
            "g" => Ok(Self::Page(number("page")?)),
            "c" if rest.is_empty() => Ok(Self::ClearCompany),
            "c" => Ok(Self::Company(rest.to_string())),
            "f" => Ok(Self::FilterRow(number("row")?)),
            "s" => {
                let mut parts = rest.split_whitespace();
                let field = parts
                    .next()
                    .ok_or_else(|| "sort needs a field".to_string())?
                    .parse::<SortField>()?;
                let direction = match parts.next() {
                    Some(dir) => dir.parse::<SortDirection>()?,
                    None => SortDirection::Asc,
                };
                Ok(Self::Sort(field, direction))
            }
            "z" => Ok(Self::PageSize(number("page size")?)),
            "l" => Ok(Self::ListCompanies),
            "r" => Ok(Self::Refresh),
            "d" => Ok(Self::Dismiss),
            "h" | "?" => Ok(Self::Help),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}

/// Run one command. Fetch failures are already reflected in the table state.
async fn execute<A: DrugApi>(controller: &TableController<A>, command: BrowseCommand) -> Option<String> {
    let outcome: ClientResult<()> = match command {
        BrowseCommand::Next => controller.next_page().await,
        BrowseCommand::Prev => controller.prev_page().await,
        BrowseCommand::Page(page) => controller.go_to_page(page).await,
        BrowseCommand::Company(company) => controller.select_company(Some(company)).await,
        BrowseCommand::ClearCompany => controller.clear_filter().await,
        BrowseCommand::FilterRow(row) => controller.filter_by_row(row).await,
        BrowseCommand::Sort(field, direction) => controller.sort_by(field, direction).await,
        BrowseCommand::PageSize(size) => controller.change_page_size(size).await,
        BrowseCommand::Refresh => controller.refresh().await,
        BrowseCommand::Dismiss => {
            controller.dismiss_error();
            Ok(())
        }
        BrowseCommand::ListCompanies => {
            return Some(controller.snapshot().companies().join("\n"));
        }
        BrowseCommand::Help => return Some(HELP.to_string()),
        BrowseCommand::Quit => return None,
    };
    if let Err(e) = outcome {
        debug!("Command failed: {}", e);
    }
    Some(render(&controller.snapshot()))
}

/// Apply `--company` and `--page`. A failed fetch shows up as the error
/// banner, so it does not abort the session.
async fn apply_start_options<A: DrugApi>(
    controller: &TableController<A>,
    company: Option<String>,
    page: Option<u64>,
) {
    if company.is_some() {
        if let Err(e) = controller.select_company(company).await {
            debug!("Initial company filter failed: {}", e);
        }
    }
    if let Some(page) = page {
        if let Err(e) = controller.go_to_page(page).await {
            debug!("Initial page change failed: {}", e);
        }
    }
}

pub async fn run_browse(
    config: &ClientConfig,
    company: Option<String>,
    page: Option<u64>,
    interactive: bool,
) -> Result<()> {
    let controller = TableController::new(ApiClient::new(config)?);

    if let Err(e) = controller.initialize().await {
        println!("{}", render(&controller.snapshot()));
        return Err(anyhow!("Could not load drugs from {}: {}", config.base_url, e));
    }
    apply_start_options(&controller, company, page).await;
    println!("{}", render(&controller.snapshot()));

    if !interactive {
        return Ok(());
    }

    println!("Type h for help.");
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.parse::<BrowseCommand>() {
            Ok(command) => match execute(&controller, command).await {
                Some(output) => println!("{}", output),
                None => break,
            },
            Err(message) => println!("{} (h for help)", message),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api::ClientError;
    use crate::client::state::{DrugQuery, REFRESH_FAILED};
    use crate::model::{Drug, DrugView, Pagination};
    use crate::services::{table_config, DrugPage, TableConfig};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    /// Serves page 1 of any query and fails everything past it
    struct FirstPageOnly;

    #[async_trait]
    impl DrugApi for FirstPageOnly {
        async fn fetch_config(&self) -> ClientResult<TableConfig> {
            Ok(table_config())
        }

        async fn fetch_companies(&self) -> ClientResult<Vec<String>> {
            Ok(vec!["A".into()])
        }

        async fn fetch_drugs(&self, query: &DrugQuery) -> ClientResult<DrugPage> {
            if query.page > 1 {
                return Err(ClientError::Status {
                    status: 500,
                    message: "Failed to fetch drugs".into(),
                });
            }
            let drug = Drug {
                id: 1,
                code: "A1".to_string(),
                generic_name: "g".to_string(),
                brand_name: "b".to_string(),
                company: "A".to_string(),
                launch_date: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            };
            Ok(DrugPage {
                drugs: vec![DrugView::ranked(drug, 1)],
                pagination: Pagination::compute(1, query.page_size, 120),
            })
        }
    }

    #[tokio::test]
    async fn failed_start_page_leaves_banner_and_keeps_filter() {
        let controller = TableController::new(FirstPageOnly);
        controller.initialize().await.unwrap();

        apply_start_options(&controller, Some("A".into()), Some(2)).await;

        let state = controller.snapshot();
        assert_eq!(state.query().company.as_deref(), Some("A"));
        assert_eq!(state.error_message(), Some(REFRESH_FAILED));
        assert_eq!(state.drugs()[0].code, "A1");
    }

    #[test]
    fn parses_navigation() {
        assert_eq!("n".parse::<BrowseCommand>(), Ok(BrowseCommand::Next));
        assert_eq!(" p ".parse::<BrowseCommand>(), Ok(BrowseCommand::Prev));
        assert_eq!("g 3".parse::<BrowseCommand>(), Ok(BrowseCommand::Page(3)));
        assert!("g 0".parse::<BrowseCommand>().is_err());
        assert!("g x".parse::<BrowseCommand>().is_err());
    }

    #[test]
    fn parses_company_filter() {
        assert_eq!(
            "c Sun Pharma".parse::<BrowseCommand>(),
            Ok(BrowseCommand::Company("Sun Pharma".to_string()))
        );
        assert_eq!("c".parse::<BrowseCommand>(), Ok(BrowseCommand::ClearCompany));
        assert_eq!("c   ".parse::<BrowseCommand>(), Ok(BrowseCommand::ClearCompany));
        assert_eq!("f 12".parse::<BrowseCommand>(), Ok(BrowseCommand::FilterRow(12)));
        assert_eq!(
            "f".parse::<BrowseCommand>(),
            Err("row must be a positive integer".to_string())
        );
    }

    #[test]
    fn parses_sort() {
        assert_eq!(
            "s code".parse::<BrowseCommand>(),
            Ok(BrowseCommand::Sort(SortField::Code, SortDirection::Asc))
        );
        assert_eq!(
            "s launchDate DESC".parse::<BrowseCommand>(),
            Ok(BrowseCommand::Sort(SortField::LaunchDate, SortDirection::Desc))
        );
        assert!("s displayName".parse::<BrowseCommand>().is_err());
    }

    #[test]
    fn rejects_unknown() {
        assert_eq!(
            "x".parse::<BrowseCommand>(),
            Err("unknown command 'x'".to_string())
        );
        assert!("".parse::<BrowseCommand>().is_err());
    }
}
