//! Command implementations.

pub mod collect;
pub mod fixtures;
pub mod load;
pub mod watch;

pub use self::collect::execute_collect;
pub use self::fixtures::execute_fixtures;
pub use self::load::execute_load;
pub use self::watch::execute_watch;

use crate::error::Result;
use std::io;
use std::path::Path;
use tagduel_domain::PostFeed;
use tagduel_stream::JsonlFeed;

/// Open a captured stream, or stdin when no path is given.
pub(crate) fn open_feed(input: Option<&Path>) -> Result<Box<dyn PostFeed>> {
    match input {
        Some(path) => Ok(Box::new(JsonlFeed::open(path)?)),
        None => Ok(Box::new(JsonlFeed::new(io::stdin().lock()))),
    }
}
