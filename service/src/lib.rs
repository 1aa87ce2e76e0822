mod launch;

pub use self::launch::LaunchService;
