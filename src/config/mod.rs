pub mod instances;
pub mod settings;

pub use instances::{load_instances, Credentials, InstanceConfig, InstancesConfig, Restriction};
pub use settings::Settings;
