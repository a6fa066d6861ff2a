mod anonymous;
pub use anonymous::AnonymousCredentialProvider;

mod closure;
pub use closure::ClosureCredentialProvider;

mod default;
pub use default::DefaultCredentialProvider;

mod env;
pub use env::EnvCredentialProvider;

mod refreshing;
pub use refreshing::RefreshingCredentialProvider;

mod r#static;
pub use r#static::StaticCredentialProvider;
