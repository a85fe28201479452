// Database schema for the user registry
diesel::table! {
    users (id) {
        id -> Integer,
        email -> Text,                 // UNIQUE, stored lower-cased
        first_name -> Text,
        last_name -> Text,
        birth_date -> Date,
        address -> Nullable<Text>,
        phone_number -> Nullable<Text>,
    }
}
