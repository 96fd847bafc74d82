pub mod drugs;

pub use drugs::Entity as Drugs;
