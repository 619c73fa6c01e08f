pub mod augmenter;
pub mod compose;
pub mod one_of;
pub mod pipeline_config;
pub mod some_of;

#[cfg(test)]
pub(crate) mod test_support;
