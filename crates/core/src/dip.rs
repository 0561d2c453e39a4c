//! Dip type and access-method constants and validation.
//!
//! Both sets are open-ended TEXT values in storage, constrained to the
//! known vocabulary at the API boundary. They are categories, not
//! ordinals.

/// Valid dip types.
pub const DIP_TYPE_SEAT: &str = "seat";
pub const DIP_TYPE_DESK: &str = "desk";
pub const DIP_TYPE_QUEUE: &str = "queue";
pub const DIP_TYPE_CHARGER: &str = "charger";
pub const DIP_TYPE_OTHER: &str = "other";

pub const VALID_DIP_TYPES: &[&str] = &[
    DIP_TYPE_SEAT,
    DIP_TYPE_DESK,
    DIP_TYPE_QUEUE,
    DIP_TYPE_CHARGER,
    DIP_TYPE_OTHER,
];

/// Valid access methods.
pub const ACCESS_METHOD_CODE: &str = "code";
pub const ACCESS_METHOD_QR: &str = "qr";
pub const ACCESS_METHOD_PHYSICAL_HANDOFF: &str = "physical_handoff";
pub const ACCESS_METHOD_MEET_CONFIRM: &str = "meet_confirm";

pub const VALID_ACCESS_METHODS: &[&str] = &[
    ACCESS_METHOD_CODE,
    ACCESS_METHOD_QR,
    ACCESS_METHOD_PHYSICAL_HANDOFF,
    ACCESS_METHOD_MEET_CONFIRM,
];

/// Validate that a dip type is one of the accepted values.
pub fn validate_dip_type(dip_type: &str) -> Result<(), String> {
    if VALID_DIP_TYPES.contains(&dip_type) {
        Ok(())
    } else {
        Err(format!(
            "Invalid dip type '{dip_type}'. Must be one of: {}",
            VALID_DIP_TYPES.join(", ")
        ))
    }
}

/// Validate that an access method is one of the accepted values.
pub fn validate_access_method(method: &str) -> Result<(), String> {
    if VALID_ACCESS_METHODS.contains(&method) {
        Ok(())
    } else {
        Err(format!(
            "Invalid access method '{method}'. Must be one of: {}",
            VALID_ACCESS_METHODS.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_dip_types_accepted() {
        for t in VALID_DIP_TYPES {
            assert!(validate_dip_type(t).is_ok());
        }
    }

    #[test]
    fn test_invalid_dip_type_rejected() {
        let result = validate_dip_type("parking");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid dip type"));
        assert!(validate_dip_type("").is_err());
        assert!(validate_dip_type("Seat").is_err());
    }

    #[test]
    fn test_valid_access_methods_accepted() {
        for m in VALID_ACCESS_METHODS {
            assert!(validate_access_method(m).is_ok());
        }
    }

    #[test]
    fn test_invalid_access_method_rejected() {
        assert!(validate_access_method("carrier_pigeon").is_err());
        assert!(validate_access_method("").is_err());
    }
}
