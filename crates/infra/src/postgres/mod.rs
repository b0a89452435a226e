pub mod postgres_connection;
pub mod repositories;

#[cfg(test)]
pub(crate) mod test_support;
