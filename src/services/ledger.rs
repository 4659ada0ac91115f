//! The completion ledger: the one write path for goal completions. Per
//! (goal, period) the state machine is Uncompleted -> Completed -> Uncompleted,
//! single-step undo only.

use chrono::Utc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CoreResult, Error};
use crate::models::{Completion, CompletionOutcome, Goal, GoalStatsPatch, UserStatsPatch};
use crate::services::period::{current_period, Period};
use crate::services::{points, streak};
use crate::store::LedgerStore;

pub struct CompletionLedger<S, C> {
    store: S,
    clock: C,
}

impl<S: LedgerStore, C: Clock> CompletionLedger<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records a completion for the goal's current period.
    ///
    /// The early `find_in_period` check is a fast path for the common
    /// duplicate-tap case; the store's uniqueness key on
    /// (goal, period_start) closes the race, so two concurrent calls cannot
    /// both award points — the loser observes `AlreadyCompleted`.
    ///
    /// Badge evaluation is deliberately not part of this write; callers run
    /// `BadgeEvaluator::award_new` against refreshed stats afterwards.
    pub async fn complete(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<CompletionOutcome> {
        let goal = self.load_goal(user_id, goal_id).await?;
        let now = self.clock.now();
        let completed_at = now.with_timezone(&Utc);
        let period = current_period(goal.recurrence, goal.custom_deadline, now);

        if self
            .store
            .find_in_period(goal_id, period.start, period.end)
            .await?
            .is_some()
        {
            return Err(Error::AlreadyCompleted);
        }

        let advanced = streak::advance(goal.current_streak, goal.longest_streak);
        let points_earned = points::points_for(goal.recurrence, advanced.current);

        let completion = Completion {
            id: Uuid::new_v4(),
            goal_id,
            user_id,
            completed_at,
            period_start: period.start,
            period_end: period.end,
            points_earned,
            streak_at_completion: advanced.current,
        };
        let goal_patch = GoalStatsPatch {
            current_streak: advanced.current,
            longest_streak: advanced.longest,
            total_completions: goal.total_completions + 1,
            last_completed_at: Some(completed_at),
        };
        // The global counters follow the same rules as the per-goal pair;
        // they are separate accumulators, not a mirror of any one goal.
        let stats_patch = UserStatsPatch {
            points_delta: points_earned,
            completions_delta: 1,
            streak_delta: 1,
        };

        self.store
            .commit_completion(&completion, &goal_patch, stats_patch)
            .await?;

        tracing::info!(
            %user_id,
            %goal_id,
            points = points_earned,
            streak = advanced.current,
            "completion recorded"
        );

        Ok(CompletionOutcome {
            points_earned,
            new_streak: advanced.current,
        })
    }

    /// Undoes the completion in the goal's current period, restoring the
    /// counters it advanced. The longest streak stays put: it is a
    /// historical maximum.
    pub async fn uncomplete(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<()> {
        let goal = self.load_goal(user_id, goal_id).await?;
        let now = self.clock.now();
        let period = current_period(goal.recurrence, goal.custom_deadline, now);

        let completion = self
            .store
            .find_in_period(goal_id, period.start, period.end)
            .await?
            .ok_or(Error::NothingToUndo)?;

        let retreated = streak::retreat(goal.current_streak, goal.total_completions);
        let goal_patch = GoalStatsPatch {
            current_streak: retreated.current,
            longest_streak: goal.longest_streak,
            total_completions: retreated.total_completions,
            last_completed_at: goal.last_completed_at,
        };
        let stats_patch = UserStatsPatch {
            points_delta: -completion.points_earned,
            completions_delta: -1,
            streak_delta: -1,
        };

        self.store
            .revert_completion(user_id, goal_id, completion.id, &goal_patch, stats_patch)
            .await?;

        tracing::info!(
            %user_id,
            %goal_id,
            points_returned = completion.points_earned,
            "completion undone"
        );

        Ok(())
    }

    /// Whether the goal is already completed for its current period (the UI
    /// checkmark read).
    pub async fn completed_in_period(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<bool> {
        let goal = self.load_goal(user_id, goal_id).await?;
        let period = self.period_of(&goal);
        Ok(self
            .store
            .find_in_period(goal_id, period.start, period.end)
            .await?
            .is_some())
    }

    /// Active goals whose current period covers "now". Daily goals are always
    /// due; a custom goal whose deadline has passed drops out.
    pub async fn due_in_current_period(&self, user_id: Uuid) -> CoreResult<Vec<Goal>> {
        let now = self.clock.now();
        let goals = self.store.active_goals(user_id).await?;
        Ok(goals
            .into_iter()
            .filter(|g| {
                current_period(g.recurrence, g.custom_deadline, now)
                    .contains(now.with_timezone(&Utc))
            })
            .collect())
    }

    fn period_of(&self, goal: &Goal) -> Period {
        current_period(goal.recurrence, goal.custom_deadline, self.clock.now())
    }

    async fn load_goal(&self, user_id: Uuid, goal_id: Uuid) -> CoreResult<Goal> {
        self.store
            .goal(user_id, goal_id)
            .await?
            .ok_or_else(|| Error::goal_not_found(goal_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{NewGoal, Recurrence};
    use crate::store::{GoalStore, MemoryStore, UserStatsStore};
    use chrono::{DateTime, Duration, FixedOffset};

    fn at(s: &str) -> DateTime<FixedOffset> {
        s.parse().unwrap()
    }

    async fn setup(
        recurrence: Recurrence,
        now: DateTime<FixedOffset>,
    ) -> (CompletionLedger<MemoryStore, FixedClock>, Uuid, Uuid) {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let goal = Goal::new(
            user_id,
            NewGoal {
                title: "Practice guitar".into(),
                description: None,
                theme_id: "creativity".into(),
                recurrence,
                custom_deadline: None,
            },
            now.with_timezone(&Utc),
        );
        let goal_id = goal.id;
        store.insert_goal(&goal).await.unwrap();
        (
            CompletionLedger::new(store, FixedClock(now)),
            user_id,
            goal_id,
        )
    }

    #[tokio::test]
    async fn complete_awards_points_and_advances_streak() {
        let now = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, goal_id) = setup(Recurrence::Daily, now).await;

        let outcome = ledger.complete(user_id, goal_id).await.unwrap();
        assert_eq!(outcome.new_streak, 1);
        assert_eq!(outcome.points_earned, 10);

        let goal = ledger.store().goal(user_id, goal_id).await.unwrap().unwrap();
        assert_eq!(goal.current_streak, 1);
        assert_eq!(goal.longest_streak, 1);
        assert_eq!(goal.total_completions, 1);
        assert_eq!(goal.last_completed_at, Some(now.with_timezone(&Utc)));

        let stats = ledger.store().user_stats(user_id).await.unwrap();
        assert_eq!(stats.points, 10);
        assert_eq!(stats.total_completions, 1);
        assert_eq!(stats.current_streak, 1);
    }

    #[tokio::test]
    async fn second_complete_in_same_period_is_already_completed() {
        let now = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, goal_id) = setup(Recurrence::Daily, now).await;

        ledger.complete(user_id, goal_id).await.unwrap();
        let second = ledger.complete(user_id, goal_id).await;
        assert!(matches!(second, Err(Error::AlreadyCompleted)));

        // Exactly one completion, one points award.
        let stats = ledger.store().user_stats(user_id).await.unwrap();
        assert_eq!(stats.points, 10);
        assert_eq!(stats.total_completions, 1);
    }

    #[tokio::test]
    async fn consecutive_days_both_succeed_and_multiply() {
        let day1 = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, goal_id) = setup(Recurrence::Daily, day1).await;
        let store = ledger.store().clone();

        ledger.complete(user_id, goal_id).await.unwrap();

        // Same goal, next calendar day.
        let ledger = CompletionLedger::new(store, FixedClock(day1 + Duration::days(1)));
        let outcome = ledger.complete(user_id, goal_id).await.unwrap();
        assert_eq!(outcome.new_streak, 2);
        assert_eq!(outcome.points_earned, 10);
    }

    #[tokio::test]
    async fn streak_multiplier_kicks_in() {
        let now = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, goal_id) = setup(Recurrence::Daily, now).await;

        // Simulate a goal already on a 6-day run; the 7th lands the 1.5x tier.
        let store = ledger.store();
        let mut goal = store.goal(user_id, goal_id).await.unwrap().unwrap();
        goal.current_streak = 6;
        goal.longest_streak = 6;
        goal.total_completions = 6;
        store.insert_goal(&goal).await.unwrap();

        let outcome = ledger.complete(user_id, goal_id).await.unwrap();
        assert_eq!(outcome.new_streak, 7);
        assert_eq!(outcome.points_earned, 15);
    }

    #[tokio::test]
    async fn uncomplete_round_trips_exactly() {
        let now = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, goal_id) = setup(Recurrence::Weekly, now).await;

        let before = ledger.store().goal(user_id, goal_id).await.unwrap().unwrap();
        ledger.complete(user_id, goal_id).await.unwrap();
        ledger.uncomplete(user_id, goal_id).await.unwrap();

        let after = ledger.store().goal(user_id, goal_id).await.unwrap().unwrap();
        assert_eq!(after.current_streak, before.current_streak);
        assert_eq!(after.total_completions, before.total_completions);

        let stats = ledger.store().user_stats(user_id).await.unwrap();
        assert_eq!(stats.points, 0);
        assert_eq!(stats.total_completions, 0);
    }

    #[tokio::test]
    async fn uncomplete_without_completion_is_nothing_to_undo() {
        let now = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, goal_id) = setup(Recurrence::Daily, now).await;

        let result = ledger.uncomplete(user_id, goal_id).await;
        assert!(matches!(result, Err(Error::NothingToUndo)));
    }

    #[tokio::test]
    async fn longest_streak_survives_undo() {
        let now = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, goal_id) = setup(Recurrence::Daily, now).await;

        ledger.complete(user_id, goal_id).await.unwrap();
        ledger.uncomplete(user_id, goal_id).await.unwrap();

        let goal = ledger.store().goal(user_id, goal_id).await.unwrap().unwrap();
        assert_eq!(goal.current_streak, 0);
        assert_eq!(goal.longest_streak, 1);
    }

    #[tokio::test]
    async fn unknown_goal_is_not_found() {
        let now = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, _) = setup(Recurrence::Daily, now).await;

        let result = ledger.complete(user_id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn completed_in_period_reflects_ledger_state() {
        let now = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, goal_id) = setup(Recurrence::Monthly, now).await;

        assert!(!ledger.completed_in_period(user_id, goal_id).await.unwrap());
        ledger.complete(user_id, goal_id).await.unwrap();
        assert!(ledger.completed_in_period(user_id, goal_id).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_completes_award_once() {
        let now = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, goal_id) = setup(Recurrence::Daily, now).await;
        let ledger = std::sync::Arc::new(ledger);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(
                async move { ledger.complete(user_id, goal_id).await },
            ));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1, "exactly one concurrent complete may win");

        let stats = ledger.store().user_stats(user_id).await.unwrap();
        assert_eq!(stats.points, 10);
        assert_eq!(stats.total_completions, 1);
    }

    #[tokio::test]
    async fn history_lists_completions_newest_first() {
        use crate::store::CompletionStore;

        let day1 = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, goal_id) = setup(Recurrence::Daily, day1).await;
        let store = ledger.store().clone();
        ledger.complete(user_id, goal_id).await.unwrap();

        let day2 = day1 + Duration::days(1);
        let ledger = CompletionLedger::new(store.clone(), FixedClock(day2));
        ledger.complete(user_id, goal_id).await.unwrap();

        let history = store
            .completions_between(
                user_id,
                (day1 - Duration::days(1)).with_timezone(&Utc),
                (day2 + Duration::days(1)).with_timezone(&Utc),
            )
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].completed_at, day2.with_timezone(&Utc));
        assert_eq!(history[1].completed_at, day1.with_timezone(&Utc));
    }

    #[tokio::test]
    async fn local_day_spanning_utc_midnight_is_one_period() {
        // 3pm at UTC-8 is 23:00Z; two hours later the UTC date has rolled
        // over but the local day has not.
        let afternoon = at("2026-03-14T15:00:00-08:00");
        let (ledger, user_id, goal_id) = setup(Recurrence::Daily, afternoon).await;
        let store = ledger.store().clone();

        ledger.complete(user_id, goal_id).await.unwrap();

        let evening = at("2026-03-14T17:00:00-08:00");
        let ledger = CompletionLedger::new(store.clone(), FixedClock(evening));
        let second = ledger.complete(user_id, goal_id).await;
        assert!(
            matches!(second, Err(Error::AlreadyCompleted)),
            "same local calendar day must not complete twice"
        );

        let stats = store.user_stats(user_id).await.unwrap();
        assert_eq!(stats.points, 10);
        assert_eq!(stats.total_completions, 1);

        // The next local day is a fresh period.
        let next_day = at("2026-03-15T08:00:00-08:00");
        let ledger = CompletionLedger::new(store, FixedClock(next_day));
        let outcome = ledger.complete(user_id, goal_id).await.unwrap();
        assert_eq!(outcome.new_streak, 2);
    }

    #[tokio::test]
    async fn expired_custom_goal_is_not_due() {
        let now = at("2026-02-03T09:00:00Z");
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let expired = Goal::new(
            user_id,
            NewGoal {
                title: "File taxes".into(),
                description: None,
                theme_id: "finance".into(),
                recurrence: Recurrence::Custom,
                custom_deadline: Some("2026-01-20".parse().unwrap()),
            },
            now.with_timezone(&Utc),
        );
        let open = Goal::new(
            user_id,
            NewGoal {
                title: "Plan trip".into(),
                description: None,
                theme_id: "personal".into(),
                recurrence: Recurrence::Custom,
                custom_deadline: Some("2026-06-30".parse().unwrap()),
            },
            now.with_timezone(&Utc),
        );
        store.insert_goal(&expired).await.unwrap();
        store.insert_goal(&open).await.unwrap();

        let ledger = CompletionLedger::new(store, FixedClock(now));
        let due = ledger.due_in_current_period(user_id).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, open.id);
    }

    #[tokio::test]
    async fn uncomplete_clamps_inconsistent_state_at_zero() {
        let now = at("2026-02-03T09:00:00Z");
        let (ledger, user_id, goal_id) = setup(Recurrence::Daily, now).await;

        ledger.complete(user_id, goal_id).await.unwrap();

        // Corrupt the aggregates below what the undo will subtract.
        ledger
            .store()
            .apply_stats_patch(
                user_id,
                UserStatsPatch {
                    points_delta: -5,
                    completions_delta: 0,
                    streak_delta: 0,
                },
            )
            .await
            .unwrap();

        ledger.uncomplete(user_id, goal_id).await.unwrap();
        let stats = ledger.store().user_stats(user_id).await.unwrap();
        assert_eq!(stats.points, 0);
        assert_eq!(stats.total_completions, 0);
    }
}
