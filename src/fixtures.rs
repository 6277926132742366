#[cfg(test)]
pub mod test {
    use std::time::Duration;

    use chrono::{DateTime, Utc};
    use confique::Config;

    use crate::defaults::load_defaults;
    use crate::error::BindError;
    use crate::schema::{Field, Schema};

    #[derive(Config, Debug, Clone, PartialEq)]
    pub struct TestConfig {
        /// The application host.
        #[config(default = "localhost")]
        pub host: String,

        /// The port number.
        #[config(default = 8080)]
        pub port: u16,

        /// Enable debug mode.
        #[config(default = false)]
        pub debug: bool,

        /// Database settings.
        #[config(nested)]
        pub database: TestDbConfig,
    }

    #[derive(Config, Debug, Clone, PartialEq)]
    pub struct TestDbConfig {
        /// Connection string URL.
        pub url: Option<String>,

        /// Connection pool size.
        #[config(default = 5)]
        pub pool_size: usize,
    }

    impl TestConfig {
        /// All fields at their zero values, as before any binding.
        pub fn empty() -> Self {
            TestConfig {
                host: String::new(),
                port: 0,
                debug: false,
                database: TestDbConfig {
                    url: None,
                    pool_size: 0,
                },
            }
        }
    }

    impl Schema for TestConfig {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::leaf("host", &mut self.host)
                    .key("host")
                    .env("HOST")
                    .flag("host"),
                Field::leaf("port", &mut self.port)
                    .key("port")
                    .env("PORT")
                    .flag("port"),
                Field::leaf("debug", &mut self.debug).key("debug").flag("debug"),
                Field::nested("database", &mut self.database).key("database"),
            ]
        }

        fn apply_defaults(&mut self) -> Result<(), BindError> {
            load_defaults(self)
        }
    }

    impl Schema for TestDbConfig {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::leaf("url", &mut self.url)
                    .key("url")
                    .env("URL"),
                Field::leaf("pool_size", &mut self.pool_size).key("pool_size"),
            ]
        }
    }

    #[test]
    fn test_config_loads_defaults() {
        let config = TestConfig::builder().load().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.pool_size, 5);
    }

    // -- Fixture for defaulting failures ------------------------------------

    #[derive(Config, Debug, PartialEq)]
    pub struct RequiredConfig {
        #[config(default = 3)]
        pub retries: u32,

        /// No default and not optional: loading defaults fails.
        pub token: String,
    }

    impl Schema for RequiredConfig {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::leaf("retries", &mut self.retries).key("retries"),
                Field::leaf("token", &mut self.token).key("token"),
            ]
        }

        fn apply_defaults(&mut self) -> Result<(), BindError> {
            load_defaults(self)
        }
    }

    // -- Fixture covering every built-in kind -------------------------------

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct KindsConfig {
        pub small: i8,
        pub medium: i32,
        pub large: i64,
        pub count: u32,
        pub size: usize,
        pub ratio: f32,
        pub rate: f64,
        pub started: DateTime<Utc>,
        pub timeout: Duration,
        pub tags: Vec<String>,
        pub ids: Vec<i64>,
        pub anything: Vec<toml::Value>,
        pub enabled: bool,
    }

    impl Schema for KindsConfig {
        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::leaf("small", &mut self.small).key("small"),
                Field::leaf("medium", &mut self.medium).key("medium"),
                Field::leaf("large", &mut self.large).key("large"),
                Field::leaf("count", &mut self.count).key("count"),
                Field::leaf("size", &mut self.size).key("size"),
                Field::leaf("ratio", &mut self.ratio).key("ratio"),
                Field::leaf("rate", &mut self.rate).key("rate"),
                Field::leaf("started", &mut self.started).key("started"),
                Field::leaf("timeout", &mut self.timeout).key("timeout"),
                Field::leaf("tags", &mut self.tags).key("tags"),
                Field::leaf("ids", &mut self.ids).key("ids"),
                Field::leaf("anything", &mut self.anything).key("anything"),
                Field::leaf("enabled", &mut self.enabled).key("enabled"),
            ]
        }
    }
}
