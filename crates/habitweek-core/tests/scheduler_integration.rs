//! Integration tests for the weekly habit scheduler.
//!
//! These tests drive the engine through its public API against both the
//! in-memory store and the SQLite store.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;

use habitweek_core::seed::{default_habits, seed_defaults};
use habitweek_core::{
    HabitDb, HabitDraft, HabitScheduler, HabitStore, MemoryStore, Rejection, ScheduleSlot,
    SlotStatus, Week, WeekDay,
};

fn week() -> Week {
    // 2026-10-17 is a Saturday.
    Week::starting(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap())
}

fn at(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

fn draft(name: &str, frequency: u32, minutes: u32, start_hour: u32, end_hour: u32) -> HabitDraft {
    HabitDraft {
        name: name.to_string(),
        frequency_per_week: frequency,
        min_duration_minutes: minutes,
        start_hour,
        end_hour,
        is_active: true,
    }
}

fn week_slots<S: HabitStore>(scheduler: &HabitScheduler<S>) -> Vec<ScheduleSlot> {
    scheduler
        .store()
        .list_slots_between(week().start, week().end())
        .unwrap()
}

#[test]
fn test_workout_fills_first_four_days_at_six() {
    let mut scheduler = HabitScheduler::new(MemoryStore::new());
    let workout = scheduler.create_habit(&draft("Workout", 4, 30, 6, 22)).unwrap();

    let created = scheduler.create_schedule(week()).unwrap();

    assert_eq!(created.len(), 4);
    let days: HashSet<_> = created.iter().map(|s| s.date).collect();
    assert_eq!(days.len(), 4);
    assert!(created.iter().all(|s| s.habit_id == workout.id));
    assert!(created.iter().all(|s| s.start_time == at(6)));
    assert!(created.iter().all(|s| s.duration_minutes == 30));
}

#[test]
fn test_later_booking_leaves_window_start_free() {
    let mut scheduler = HabitScheduler::new(MemoryStore::new());
    let workout = scheduler.create_habit(&draft("Workout", 4, 30, 6, 22)).unwrap();
    let read = scheduler.create_habit(&draft("Read", 1, 30, 9, 22)).unwrap();

    let monday = week().date_of(WeekDay::Mon);
    scheduler.add_habit(read.id, WeekDay::Mon, week()).unwrap().applied().unwrap();

    let found = scheduler.find_available_time(monday, &workout).unwrap();
    assert_eq!(found, Some(at(6)));
}

#[test]
fn test_move_to_full_day_leaves_slot_unchanged() {
    let mut scheduler = HabitScheduler::new(MemoryStore::new());
    // One habit per hour of a short window, all booked on Monday.
    let blockers: Vec<_> = (0..3)
        .map(|i| {
            scheduler
                .create_habit(&draft(&format!("Blocker {i}"), 1, 60, 8, 11))
                .unwrap()
        })
        .collect();
    for blocker in &blockers {
        scheduler.add_habit(blocker.id, WeekDay::Mon, week()).unwrap().applied().unwrap();
    }

    let mover = scheduler.create_habit(&draft("Read", 2, 30, 8, 11)).unwrap();
    let slot = scheduler
        .add_habit(mover.id, WeekDay::Sat, week())
        .unwrap()
        .applied()
        .unwrap();

    let outcome = scheduler.move_slot(slot.id, WeekDay::Mon, week()).unwrap();
    assert_eq!(
        outcome.rejection(),
        Some(&Rejection::NoAvailability {
            habit_id: mover.id,
            date: week().date_of(WeekDay::Mon),
        })
    );
    assert_eq!(scheduler.store().get_slot(slot.id).unwrap(), Some(slot));
}

#[test]
fn test_add_habit_at_quota_creates_nothing() {
    let mut scheduler = HabitScheduler::new(MemoryStore::new());
    let read = scheduler.create_habit(&draft("Read", 2, 30, 8, 22)).unwrap();
    scheduler.create_schedule(week()).unwrap();
    let before = week_slots(&scheduler).len();

    let outcome = scheduler.add_habit(read.id, WeekDay::Thu, week()).unwrap();
    assert!(matches!(
        outcome.rejection(),
        Some(Rejection::QuotaExhausted { scheduled: 2, target: 2, .. })
    ));
    assert_eq!(week_slots(&scheduler).len(), before);
}

#[test]
fn test_missed_slot_is_rescheduled_to_next_free_day() {
    let mut scheduler = HabitScheduler::new(MemoryStore::new());
    let workout = scheduler.create_habit(&draft("Workout", 2, 30, 6, 22)).unwrap();
    let created = scheduler.create_schedule(week()).unwrap();
    let saturday_slot = created[0].clone();
    assert_eq!(saturday_slot.date, week().start);

    scheduler.mark_missed(saturday_slot.id).unwrap().applied().unwrap();
    let result = scheduler.reschedule(saturday_slot.id).unwrap().applied().unwrap();

    assert_eq!(result.original.status, SlotStatus::Missed);
    // Sunday is already taken by the second workout.
    assert_eq!(result.replacement.date, week().date_of(WeekDay::Mon));
    assert_eq!(result.replacement.habit_id, workout.id);
    assert_eq!(week_slots(&scheduler).len(), 2);
}

#[test]
fn test_seeded_week_on_sqlite() {
    let mut db = HabitDb::open_memory().unwrap();
    assert_eq!(seed_defaults(&mut db).unwrap(), 3);

    let mut scheduler = HabitScheduler::new(db);
    let created = scheduler.create_schedule(week()).unwrap();
    let total: u32 = default_habits().iter().map(|d| d.frequency_per_week).sum();
    assert_eq!(created.len() as u32, total);

    // Second run adds nothing.
    assert!(scheduler.create_schedule(week()).unwrap().is_empty());

    let entries = scheduler.week_entries(week()).unwrap();
    assert_eq!(entries.len(), created.len());
    assert!(entries.iter().all(|e| !e.habit_name.is_empty()));
    assert!(entries
        .windows(2)
        .all(|w| (w[0].date, w[0].start_time) <= (w[1].date, w[1].start_time)));

    assert_eq!(scheduler.clear_week(week()).unwrap(), created.len());
    assert!(scheduler.week_entries(week()).unwrap().is_empty());
}

#[test]
fn test_clear_week_leaves_other_weeks() {
    let mut scheduler = HabitScheduler::new(MemoryStore::new());
    scheduler.create_habit(&draft("Code", 7, 30, 7, 19)).unwrap();
    let next = Week::starting(week().start + chrono::Days::new(7));
    scheduler.create_schedule(week()).unwrap();
    scheduler.create_schedule(next).unwrap();

    assert_eq!(scheduler.clear_week(week()).unwrap(), 7);
    assert_eq!(scheduler.week_entries(next).unwrap().len(), 7);
}

fn arb_draft() -> impl Strategy<Value = HabitDraft> {
    (1u32..=7, 1u32..=150, 0u32..=20, 1u32..=6, any::<bool>()).prop_map(
        |(frequency, minutes, start_hour, span, is_active)| {
            let end_hour = (start_hour + span).min(24);
            let minutes = minutes.min((end_hour - start_hour) * 60);
            HabitDraft {
                name: format!("Habit {frequency}-{minutes}-{start_hour}"),
                frequency_per_week: frequency,
                min_duration_minutes: minutes,
                start_hour,
                end_hour,
                is_active,
            }
        },
    )
}

fn schedule_all(drafts: &[HabitDraft]) -> (HabitScheduler<MemoryStore>, Vec<ScheduleSlot>) {
    let mut scheduler = scheduler_with(drafts);
    let created = scheduler.create_schedule(week()).unwrap();
    (scheduler, created)
}

proptest! {
    #[test]
    fn prop_slots_on_a_day_never_overlap(drafts in prop::collection::vec(arb_draft(), 1..6)) {
        let (scheduler, _) = schedule_all(&drafts);
        check_no_overlaps(&week_slots(&scheduler))?;
    }

    #[test]
    fn prop_at_most_one_slot_per_habit_per_day(drafts in prop::collection::vec(arb_draft(), 1..6)) {
        let (scheduler, _) = schedule_all(&drafts);
        let mut seen = HashSet::new();
        for slot in week_slots(&scheduler) {
            prop_assert!(seen.insert((slot.habit_id, slot.date)));
        }
    }

    #[test]
    fn prop_slots_stay_inside_habit_window(drafts in prop::collection::vec(arb_draft(), 1..6)) {
        let (scheduler, created) = schedule_all(&drafts);
        for slot in &created {
            let habit = scheduler.store().get_habit(slot.habit_id).unwrap().unwrap();
            prop_assert!(habit.is_active);
            prop_assert!(slot.start_minute() >= habit.start_hour * 60);
            prop_assert!(slot.end_minute() <= habit.end_hour * 60);
            prop_assert!(week().contains(slot.date));
        }
    }

    #[test]
    fn prop_never_exceeds_weekly_target(drafts in prop::collection::vec(arb_draft(), 1..6)) {
        let (scheduler, created) = schedule_all(&drafts);
        for habit in scheduler.store().list_habits().unwrap() {
            let count = created.iter().filter(|s| s.habit_id == habit.id).count() as u32;
            prop_assert!(count <= habit.frequency_per_week);
        }
    }

    #[test]
    fn prop_lone_habit_gets_full_target(d in arb_draft()) {
        let d = HabitDraft { is_active: true, ..d };
        let (_, created) = schedule_all(std::slice::from_ref(&d));
        prop_assert_eq!(created.len() as u32, d.frequency_per_week);
    }

    #[test]
    fn prop_schedule_is_deterministic(drafts in prop::collection::vec(arb_draft(), 1..6)) {
        let (_, first) = schedule_all(&drafts);
        let (_, second) = schedule_all(&drafts);
        prop_assert_eq!(first, second);
    }
}

/// One engine call in a randomly generated session. Indexes pick a habit or a
/// slot of the week modulo the current count.
#[derive(Debug, Clone)]
enum Op {
    Fill,
    Add(usize, WeekDay),
    Move(usize, WeekDay),
    Reschedule(usize),
    Complete(usize),
    Miss(usize),
}

fn arb_day() -> impl Strategy<Value = WeekDay> {
    prop::sample::select(WeekDay::ALL.to_vec())
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Fill),
        (any::<usize>(), arb_day()).prop_map(|(i, day)| Op::Add(i, day)),
        (any::<usize>(), arb_day()).prop_map(|(i, day)| Op::Move(i, day)),
        any::<usize>().prop_map(Op::Reschedule),
        any::<usize>().prop_map(Op::Complete),
        any::<usize>().prop_map(Op::Miss),
    ]
}

fn apply(scheduler: &mut HabitScheduler<MemoryStore>, op: &Op) {
    let habits = scheduler.store().list_habits().unwrap();
    let slots = week_slots(scheduler);
    let slot_at = |i: usize| (!slots.is_empty()).then(|| slots[i % slots.len()].id);

    match *op {
        Op::Fill => {
            scheduler.create_schedule(week()).unwrap();
        }
        Op::Add(i, day) => {
            if !habits.is_empty() {
                let habit_id = habits[i % habits.len()].id;
                let _ = scheduler.add_habit(habit_id, day, week()).unwrap();
            }
        }
        Op::Move(i, day) => {
            if let Some(id) = slot_at(i) {
                let _ = scheduler.move_slot(id, day, week()).unwrap();
            }
        }
        Op::Reschedule(i) => {
            if let Some(id) = slot_at(i) {
                let _ = scheduler.reschedule(id).unwrap();
            }
        }
        Op::Complete(i) => {
            if let Some(id) = slot_at(i) {
                let _ = scheduler.mark_completed(id).unwrap();
            }
        }
        Op::Miss(i) => {
            if let Some(id) = slot_at(i) {
                let _ = scheduler.mark_missed(id).unwrap();
            }
        }
    }
}

fn check_no_overlaps(slots: &[ScheduleSlot]) -> Result<(), TestCaseError> {
    for (i, a) in slots.iter().enumerate() {
        for b in slots.iter().skip(i + 1) {
            if a.date == b.date {
                prop_assert!(
                    !a.overlaps(b.start_minute(), b.end_minute()),
                    "slots {} and {} overlap on {}",
                    a.id,
                    b.id,
                    a.date
                );
            }
        }
    }
    Ok(())
}

fn scheduler_with(drafts: &[HabitDraft]) -> HabitScheduler<MemoryStore> {
    let mut scheduler = HabitScheduler::new(MemoryStore::new());
    for d in drafts {
        scheduler.create_habit(d).unwrap();
    }
    scheduler
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_operation_sequences_never_overlap(
        drafts in prop::collection::vec(arb_draft(), 1..5),
        ops in prop::collection::vec(arb_op(), 1..30),
    ) {
        let mut scheduler = scheduler_with(&drafts);
        for op in &ops {
            apply(&mut scheduler, op);
            let slots = week_slots(&scheduler);
            check_no_overlaps(&slots)?;
            for slot in &slots {
                let habit = scheduler.store().get_habit(slot.habit_id).unwrap().unwrap();
                prop_assert!(slot.start_minute() >= habit.start_hour * 60);
                prop_assert!(slot.end_minute() <= habit.end_hour * 60);
            }
        }
    }

    #[test]
    fn prop_second_fill_adds_nothing(
        drafts in prop::collection::vec(arb_draft(), 1..6),
        adds in prop::collection::vec((any::<usize>(), arb_day()), 0..8),
    ) {
        let mut scheduler = scheduler_with(&drafts);
        for (i, day) in adds {
            apply(&mut scheduler, &Op::Add(i, day));
        }

        scheduler.create_schedule(week()).unwrap();
        let before = week_slots(&scheduler);
        prop_assert!(scheduler.create_schedule(week()).unwrap().is_empty());
        prop_assert_eq!(week_slots(&scheduler), before);
    }

    #[test]
    fn prop_fill_count_is_capped_by_open_days(
        target in arb_draft(),
        blockers in prop::collection::vec(arb_draft(), 0..4),
        adds in prop::collection::vec((any::<usize>(), arb_day()), 0..12),
    ) {
        // Only the target is active, so the fill touches nothing else.
        let mut scheduler = HabitScheduler::new(MemoryStore::new());
        let target = scheduler
            .create_habit(&HabitDraft { is_active: true, ..target })
            .unwrap();
        let mut habit_ids = vec![target.id];
        for blocker in blockers {
            let blocker = HabitDraft { is_active: false, ..blocker };
            habit_ids.push(scheduler.create_habit(&blocker).unwrap().id);
        }
        for (i, day) in adds {
            let _ = scheduler
                .add_habit(habit_ids[i % habit_ids.len()], day, week())
                .unwrap();
        }

        let target_slots = |s: &HabitScheduler<MemoryStore>| -> Vec<ScheduleSlot> {
            week_slots(s).into_iter().filter(|slot| slot.habit_id == target.id).collect()
        };
        let existing = target_slots(&scheduler);
        let booked: HashSet<NaiveDate> = existing.iter().map(|s| s.date).collect();
        let open_days = week()
            .days()
            .filter(|day| !booked.contains(day))
            .filter(|day| scheduler.find_available_time(*day, &target).unwrap().is_some())
            .count();

        let created = scheduler.create_schedule(week()).unwrap();
        prop_assert!(created.iter().all(|s| s.habit_id == target.id));

        let expected = (target.frequency_per_week as usize).min(existing.len() + open_days);
        prop_assert_eq!(target_slots(&scheduler).len(), expected);
    }
}
