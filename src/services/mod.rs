pub mod catalogue;
pub mod dispatcher;
pub mod http_client;
pub mod validation;

pub use catalogue::Catalogue;
pub use dispatcher::Dispatcher;
pub use validation::validate_arguments;
