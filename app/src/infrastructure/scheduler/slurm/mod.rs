mod client;
mod models;

pub use self::client::SlurmClient;
