pub mod api;
pub mod browse;
pub mod controller;
pub mod render;
pub mod state;

pub use api::{ApiClient, ClientError, ClientResult, DrugApi};
pub use controller::TableController;
pub use state::{DrugQuery, FetchRequest, LoadPhase, TableState};
