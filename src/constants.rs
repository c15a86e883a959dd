/// Group granting update rights over every organization, not just owned ones
pub const ORGANIZATIONS_ADMIN_GROUP: &str = "organizations_admin";

/// Permission attached to the admin group by the seeding command
pub const CAN_UPDATE_ORGANIZATIONS: &str = "can_update_organizations";

/// Country choices for organization addresses
pub const COUNTRIES: [(&str, &str); 3] = [
    ("NL", "Netherlands"),
    ("DE", "Germany"),
    ("BE", "Belgium"),
];

/// Country applied to addresses created through the web form
pub const DEFAULT_COUNTRY: &str = "DE";

/// Rank for organizations without a manual order; sorts after every ranked one
pub const DEFAULT_ORDER: i32 = 9999;

/// Password validation
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// JWT token
pub const DEFAULT_JWT_SECRET: &str = "0123456789ABCDEF0123456789ABCDEF";
