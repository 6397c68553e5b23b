use crate::data::{Data, Units};
use crate::errors::{DataError, Result};

use log::info;
use std::path::Path;
use std::sync::OnceLock;

static INSTANCE: OnceLock<Data> = OnceLock::new();

impl Data {
    /// Load the process-wide data instance from a data file, see [Data::load].
    ///
    /// The instance is loaded once and read-only afterwards:
    /// a second load is rejected with [DataError::AlreadyLoaded].
    pub fn load_instance<P: AsRef<Path>>(
        path: P,
        units: Units,
        skip: usize,
    ) -> Result<&'static Data> {
        if INSTANCE.get().is_some() {
            return Err(DataError::AlreadyLoaded);
        }
        Data::set_instance(Data::load(path, units, skip)?)
    }

    /// Install already built data as the process-wide instance
    pub fn set_instance(data: Data) -> Result<&'static Data> {
        INSTANCE.set(data).map_err(|_| DataError::AlreadyLoaded)?;
        info!("Data instance installed");
        Data::get_instance()
    }

    /// Get the process-wide data instance
    pub fn get_instance() -> Result<&'static Data> {
        INSTANCE.get().ok_or(DataError::NotLoaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::fs;

    // Single test as the instance is shared by the whole test process
    #[test]
    fn test_instance_lifecycle() {
        assert!(matches!(Data::get_instance(), Err(DataError::NotLoaded)));

        let missing = std::env::temp_dir().join("gprn-data-does-not-exist.rdb");
        assert!(matches!(
            Data::load_instance(&missing, Units::default(), 2),
            Err(DataError::LoadIoError(_))
        ));
        assert!(Data::get_instance().is_err());

        let path = std::env::temp_dir().join(format!("gprn-instance-{}.rdb", std::process::id()));
        let content = "t rv\n-- --\n\
            1.0 0.010 0.001 7.0 0.01 0.02 0.001 -4.9 0.01\n\
            2.0 0.012 0.001 7.1 0.01 0.03 0.001 -4.8 0.01\n";
        fs::write(&path, content).unwrap();
        let data = Data::load_instance(&path, Units::KilometersPerSecond, 2).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(2, data.n());
        assert_eq!(&array![1., 2.], data.get_t());

        let same = Data::get_instance().unwrap();
        assert!(std::ptr::eq(data, same));

        assert!(matches!(
            Data::load_instance(&path, Units::default(), 2),
            Err(DataError::AlreadyLoaded)
        ));
        assert!(matches!(
            Data::set_instance(data.clone()),
            Err(DataError::AlreadyLoaded)
        ));
    }
}
