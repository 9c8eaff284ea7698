use url::Url;

/// Sends the user to an external page (the authorization endpoint).
///
/// Fire-and-forget: the result of the navigation is never observed in-process.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &Url);
}
