// @generated manually, following the teacher's diesel schema conventions.

diesel::table! {
    tracks (id) {
        id -> Int4,
        #[max_length = 255]
        title -> Varchar,
        #[max_length = 255]
        artist -> Nullable<Varchar>,
        #[max_length = 255]
        album -> Nullable<Varchar>,
        duration -> Nullable<Int4>,
        indexed -> Bool,
        #[max_length = 64]
        content_hash -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    landmarks (id) {
        id -> Int8,
        #[max_length = 20]
        digest -> Varchar,
        track_id -> Int4,
        anchor_time -> Int4,
    }
}

diesel::joinable!(landmarks -> tracks (track_id));
diesel::allow_tables_to_appear_in_same_query!(landmarks, tracks);
