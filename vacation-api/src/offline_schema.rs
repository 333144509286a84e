// Tables of the local offline mirror database (see `offline_migrations/`).

diesel::table! {
    connection_info (id) {
        id -> Integer,
        tenant_id -> Nullable<Text>,
        company_name -> Nullable<Text>,
        last_online -> Timestamp,
    }
}

diesel::table! {
    offline_users (username) {
        username -> Text,
        employee_id -> Integer,
        password_hash -> Text,
        name -> Text,
        role -> Text,
        last_sync -> Timestamp,
    }
}

diesel::allow_tables_to_appear_in_same_query!(connection_info, offline_users,);
