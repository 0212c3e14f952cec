use tracing::info;
use uuid::Uuid;

use crate::db::{Database, StoreResult};

const DEVICE_ID_KEY: &str = "device_id";

/// Identifier of this installation, generated on first use and kept in the
/// settings table from then on.
pub fn device_id(db: &Database) -> StoreResult<String> {
    if let Some(existing) = db.get_setting(DEVICE_ID_KEY)? {
        return Ok(existing);
    }
    let generated = Uuid::new_v4().to_string();
    db.set_setting(DEVICE_ID_KEY, &generated)?;
    info!(device_id = %generated, "Generated device id");
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_is_stable() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();

        let first = device_id(&db).unwrap();
        let second = device_id(&db).unwrap();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
