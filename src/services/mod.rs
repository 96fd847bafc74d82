pub mod company_service;
pub mod drug_service;
pub mod import_service;
pub mod table_config;

pub use company_service::CompanyService;
pub use drug_service::{DrugListParams, DrugListRequest, DrugPage, DrugService};
pub use import_service::{ImportService, ImportSummary};
pub use table_config::{table_config, TableConfig};
