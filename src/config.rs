use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub data: DataConfig,
    pub reports: ReportConfig,
    pub ids: IdConfig,
}

/// Location of the data files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    pub dir: String,
    pub products_file: String,
    pub orders_file: String,
    pub students_file: String,
    pub teachers_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    /// Products with less stock than this show up in the inventory report
    pub low_stock_threshold: u32,
}

/// Ids handed out when a collection is still empty
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdConfig {
    pub first_order_id: u32,
    pub first_person_id: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
            products_file: "products.csv".to_string(),
            orders_file: "orders.json".to_string(),
            students_file: "students.json".to_string(),
            teachers_file: "teachers.csv".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 5,
        }
    }
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            first_order_id: 101,
            first_person_id: 1,
        }
    }
}

impl AppConfig {
    /// Load configuration from the defaults, an optional `recordkeep` config
    /// file and `RECORDKEEP__` environment variables, in that order
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("recordkeep").required(false));

        // e.g. RECORDKEEP__REPORTS__LOW_STOCK_THRESHOLD=10
        config = config.add_source(
            config::Environment::with_prefix("RECORDKEEP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = config.build()?.try_deserialize()?;

        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data.products_file, "products.csv");
        assert_eq!(config.data.teachers_file, "teachers.csv");
        assert_eq!(config.reports.low_stock_threshold, 5);
        assert_eq!(config.ids.first_order_id, 101);
        assert_eq!(config.ids.first_person_id, 1);
    }

    #[test]
    fn test_load_without_overrides() {
        let config = AppConfig::load().unwrap();
        assert_eq!(config.data.orders_file, "orders.json");
    }
}
