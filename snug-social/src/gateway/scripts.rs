use redis::Script;
use std::sync::LazyLock;

pub const COMMIT_SCRIPT_BODY: &str = include_str!("../../lua/commit.lua");

pub static COMMIT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(COMMIT_SCRIPT_BODY));
