//! Engine values to wire views.

use api_types::{
    activity::ActivityView,
    categorized::{Category, CategorizedView, EntryKind},
    flow::FlowView,
    member::MemberView,
    room::{DailyAmount, RoomListItem, RoomStatus, RoomView},
    summary::TotalsView,
};

pub(crate) fn room(room: engine::Room) -> RoomView {
    RoomView {
        id: room.id,
        room_name: room.name,
        created_at: room.created_at,
    }
}

pub(crate) fn room_listing(listing: engine::RoomListing) -> RoomListItem {
    RoomListItem {
        id: listing.room.id,
        room_name: listing.room.name,
        created_at: listing.room.created_at,
        user_count: listing.user_count,
        status: match listing.status {
            engine::RoomStatus::Empty => RoomStatus::Empty,
            engine::RoomStatus::Max => RoomStatus::Max,
        },
    }
}

pub(crate) fn member(member: engine::Member) -> MemberView {
    MemberView {
        id: member.id,
        full_name: member.full_name,
        email: member.email,
        room_id: member.room_id,
        created_at: member.created_at,
    }
}

pub(crate) fn totals(totals: &engine::FlowTotals) -> TotalsView {
    TotalsView {
        income_minor: totals.income.minor(),
        expense_minor: totals.expense.minor(),
        net_minor: totals.net.minor(),
        last_updated: totals.last_updated,
    }
}

pub(crate) fn daily(series: Vec<engine::DailyAmount>) -> Vec<DailyAmount> {
    series
        .into_iter()
        .map(|day| DailyAmount {
            day: day.day,
            amount_minor: day.amount.minor(),
        })
        .collect()
}

pub(crate) fn flow(record: engine::FlowRecord) -> FlowView {
    FlowView {
        id: record.id,
        room_id: record.room_id,
        user_id: record.user_id,
        income_minor: record.income.minor(),
        expense_minor: record.expense.minor(),
        updated_at: record.updated_at,
    }
}

pub(crate) fn categorized(record: engine::CategorizedRecord) -> CategorizedView {
    CategorizedView {
        id: record.id,
        room_id: record.room_id,
        user_id: record.user_id,
        kind: match record.kind {
            engine::EntryKind::Income => EntryKind::Income,
            engine::EntryKind::Expense => EntryKind::Expense,
        },
        category: match record.category {
            engine::Category::Food => Category::Food,
            engine::Category::Shopping => Category::Shopping,
            engine::Category::Entertainment => Category::Entertainment,
            engine::Category::Bills => Category::Bills,
            engine::Category::Other => Category::Other,
        },
        amount_minor: record.amount.minor(),
        note: record.note,
        updated_at: record.updated_at,
    }
}

pub(crate) fn activity(entry: engine::ActivityEntry) -> ActivityView {
    match entry {
        engine::ActivityEntry::Flow(record) => ActivityView::Flow(flow(record)),
        engine::ActivityEntry::Categorized(record) => {
            ActivityView::Categorized(categorized(record))
        }
    }
}
