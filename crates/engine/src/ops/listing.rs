use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::{Condition, Order, QueryFilter, QueryOrder, QuerySelect, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    ActivityEntry, CategorizedRecord, EngineError, ResultEngine, categorized, util::require_id,
};

use super::{Engine, store};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 500;

/// Which categorized records to list. Both scopes are optional; an empty
/// filter lists every room.
#[derive(Clone, Debug, Default)]
pub struct CategorizedFilter {
    pub room_id: Option<i32>,
    pub user_id: Option<i32>,
    pub limit: Option<u64>,
    /// Opaque cursor from a previous page's `next_cursor`.
    pub cursor: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedPage {
    pub items: Vec<CategorizedRecord>,
    pub next_cursor: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PageCursor {
    updated_at: DateTime<Utc>,
    id: i32,
}

impl PageCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::Validation("invalid cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::Validation("invalid cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::Validation("invalid cursor".to_string()))
    }
}

impl Engine {
    /// Categorized records, newest first by `(updated_at, id)`.
    pub async fn list_categorized(&self, filter: &CategorizedFilter) -> ResultEngine<CategorizedPage> {
        if let Some(room_id) = filter.room_id {
            require_id(room_id, "room_id")?;
        }
        if let Some(user_id) = filter.user_id {
            require_id(user_id, "user_id")?;
        }
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(EngineError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let mut query = categorized::Entity::find()
            .order_by_desc(categorized::Column::UpdatedAt)
            .order_by_desc(categorized::Column::Id)
            .limit(limit.saturating_add(1));
        if let Some(room_id) = filter.room_id {
            query = query.filter(categorized::Column::RoomId.eq(room_id));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(categorized::Column::UserId.eq(user_id));
        }
        if let Some(cursor) = filter.cursor.as_deref() {
            let cursor = PageCursor::decode(cursor)?;
            query = query.filter(
                Condition::any()
                    .add(categorized::Column::UpdatedAt.lt(cursor.updated_at))
                    .add(
                        Condition::all()
                            .add(categorized::Column::UpdatedAt.eq(cursor.updated_at))
                            .add(categorized::Column::Id.lt(cursor.id)),
                    ),
            );
        }

        let rows = query.all(&self.database).await?;
        let has_more = rows.len() as u64 > limit;
        let items = rows
            .into_iter()
            .take(limit as usize)
            .map(CategorizedRecord::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let next_cursor = match items.last() {
            Some(last) if has_more => Some(
                PageCursor {
                    updated_at: last.updated_at,
                    id: last.id,
                }
                .encode()?,
            ),
            _ => None,
        };
        Ok(CategorizedPage { items, next_cursor })
    }

    /// Both logs of a room merged into one feed, newest first.
    pub async fn list_room_activity(&self, room_id: i32) -> ResultEngine<Vec<ActivityEntry>> {
        require_id(room_id, "room_id")?;
        store::require_room(&self.database, room_id).await?;

        let flows = store::flows_in_room(&self.database, room_id, None, Order::Desc).await?;
        let categorized =
            store::categorized_in_room(&self.database, room_id, None, Order::Desc).await?;

        let mut feed: Vec<ActivityEntry> = flows
            .into_iter()
            .map(ActivityEntry::Flow)
            .chain(categorized.into_iter().map(ActivityEntry::Categorized))
            .collect();
        // Stable sort keeps each log's id order for equal timestamps.
        feed.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(feed)
    }
}
