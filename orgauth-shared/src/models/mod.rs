/// Database models
///
/// Row types and the SQL that reads and writes them.
///
/// # Models
///
/// - `user`: registered users and their public profile view
/// - `organisation`: organisations and their single owner
/// - `membership`: users added to organisations beyond the owner

pub mod membership;
pub mod organisation;
pub mod user;
