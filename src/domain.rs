mod email_address;
mod person_name;

pub use email_address::EmailAddress;
pub use person_name::PersonName;
