//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    /// Keys of a section in sorted order; empty when the section is absent.
    fn get_keys(&self, section: &str) -> Vec<String>;
}
