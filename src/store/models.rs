use chrono::NaiveDateTime;
use diesel::prelude::*;

use super::schema::{landmarks, tracks};

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = tracks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TrackRow {
    pub id: i32,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<i32>,
    pub indexed: bool,
    pub content_hash: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = tracks)]
pub struct NewTrack<'a> {
    pub title: &'a str,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    pub duration: Option<i32>,
    pub indexed: bool,
    pub content_hash: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = landmarks)]
pub struct NewLandmark<'a> {
    pub digest: &'a str,
    pub track_id: i32,
    pub anchor_time: i32,
}
