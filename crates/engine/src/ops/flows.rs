use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, prelude::*};

use crate::{
    DeleteOutcome, EditFlowCmd, EditOutcome, EngineError, FlowField, FlowReceipt, FlowRecord,
    Money, RecordFlowCmd, ResultEngine, flow_records,
    update_set::UpdateSet,
    util::{require_id, require_positive},
};

use super::{Engine, FaultPoint, store, with_tx};

impl Engine {
    /// Add an income entry to the flow log. The room balance is not touched.
    pub async fn record_income(&self, cmd: RecordFlowCmd) -> ResultEngine<FlowReceipt> {
        self.record_flow(FlowField::Income, cmd).await
    }

    /// Add an expense entry to the flow log. No funds check is made and the
    /// room balance is not touched.
    pub async fn record_expense(&self, cmd: RecordFlowCmd) -> ResultEngine<FlowReceipt> {
        self.record_flow(FlowField::Expense, cmd).await
    }

    async fn record_flow(&self, field: FlowField, cmd: RecordFlowCmd) -> ResultEngine<FlowReceipt> {
        require_id(cmd.room_id, "room_id")?;
        require_id(cmd.user_id, "user_id")?;
        let amount = require_positive(cmd.amount_minor, field.as_str())?;
        let (income, expense) = match field {
            FlowField::Income => (amount, Money::ZERO),
            FlowField::Expense => (Money::ZERO, amount),
        };

        let receipt = with_tx!(self, |db_tx| {
            let model = flow_records::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(cmd.user_id),
                room_id: ActiveValue::Set(cmd.room_id),
                income: ActiveValue::Set(income.minor()),
                expense: ActiveValue::Set(expense.minor()),
                updated_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| {
                EngineError::from(err).missing_reference(&format!(
                    "room {} or user {}",
                    cmd.room_id, cmd.user_id
                ))
            })?;
            let record = FlowRecord::try_from(model)?;
            let summary = self
                .summarize_flows(&db_tx, record.room_id, record.user_id)
                .await?;
            Ok(FlowReceipt { record, summary })
        })?;

        tracing::info!(
            room_id = receipt.record.room_id,
            user_id = receipt.record.user_id,
            field = field.as_str(),
            %amount,
            "flow entry recorded"
        );
        Ok(receipt)
    }

    /// Overwrite one field of a flow record.
    ///
    /// Exactly one of income/expense must be given, the new value must be
    /// positive and the targeted field must already be non-zero. The room
    /// balance is left alone; the returned delta is informational.
    pub async fn edit_flow(&self, cmd: EditFlowCmd) -> ResultEngine<EditOutcome<FlowRecord>> {
        require_id(cmd.id, "id")?;
        let (field, value) = match (cmd.income_minor, cmd.expense_minor) {
            (Some(value), None) => (FlowField::Income, value),
            (None, Some(value)) => (FlowField::Expense, value),
            _ => {
                return Err(EngineError::Validation(
                    "exactly one of income or expense must be given".to_string(),
                ));
            }
        };
        let value = require_positive(value, field.as_str())?;

        let outcome = with_tx!(self, |db_tx| {
            let now = Utc::now();
            let old = store::require_flow(&db_tx, cmd.id).await?;
            if old.field(field).is_zero() {
                tracing::warn!(record_id = old.id, field = field.as_str(), "edit of unset field");
                return Err(EngineError::Validation(format!(
                    "{} was never set on flow record {}",
                    field.as_str(),
                    old.id
                )));
            }

            let update = UpdateSet::<flow_records::Entity>::new()
                .set(field.column(), value.minor())
                .set(flow_records::Column::UpdatedAt, now);
            tracing::debug!(record_id = old.id, columns = ?update.columns(), "updating flow record");
            update
                .apply(flow_records::Entity::update_many())?
                .filter(flow_records::Column::Id.eq(old.id))
                .exec(&db_tx)
                .await?;

            // The room's flow totals must still be representable.
            self.summarize_flows(&db_tx, old.room_id, old.user_id).await?;

            let mut new = old.clone();
            match field {
                FlowField::Income => new.income = value,
                FlowField::Expense => new.expense = value,
            }
            new.updated_at = now;
            let delta = new.net_contribution().try_sub(old.net_contribution())?;
            Ok(EditOutcome {
                old,
                new,
                delta,
                room_total: None,
            })
        })?;

        tracing::info!(
            room_id = outcome.new.room_id,
            record_id = outcome.new.id,
            delta = %outcome.delta,
            "flow entry edited"
        );
        Ok(outcome)
    }

    /// Remove a flow record and subtract `income - expense` from the room
    /// balance, creating the balance row if the room had none.
    ///
    /// Flow writes never add to the balance, so this can drive it negative.
    pub async fn delete_flow(&self, id: i32) -> ResultEngine<DeleteOutcome<FlowRecord>> {
        require_id(id, "id")?;

        let outcome = with_tx!(self, |db_tx| {
            let now = Utc::now();
            let room_id = store::require_flow(&db_tx, id).await?.room_id;
            let locked = store::lock_room_balance(&db_tx, room_id, now).await?;
            let deleted = store::require_flow(&db_tx, id).await?;

            flow_records::Entity::delete_by_id(deleted.id)
                .exec(&db_tx)
                .await?;
            self.inject_fault(FaultPoint::AfterLedgerWrite { room_id })?;

            let adjustment = deleted.net_contribution();
            let room_total =
                store::apply_balance_delta(&db_tx, &locked, adjustment.try_neg()?, now).await?;
            Ok(DeleteOutcome {
                deleted,
                adjustment,
                room_total,
            })
        })?;

        tracing::info!(
            room_id = outcome.deleted.room_id,
            record_id = outcome.deleted.id,
            adjustment = %outcome.adjustment,
            total = %outcome.room_total,
            "flow entry deleted"
        );
        Ok(outcome)
    }
}
