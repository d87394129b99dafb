use super::{
    Clock, Engine, RawHandle, RunInfo, SegmentInfo, SystemClock, TimerSnapshot,
    BEST_SEGMENTS_COMPARISON, NULL_HANDLE, PERSONAL_BEST_COMPARISON,
};
use crate::event::{Command, CommandError, CommandResult, Event};
use crate::time::{Time, TimeSpan, TimerPhase, TimingMethod};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

const METHODS: [TimingMethod; 2] = [TimingMethod::RealTime, TimingMethod::GameTime];

/// In-process engine keeping runs and timers in a handle table.
pub struct LocalEngine {
    table: Mutex<Table>,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct Table {
    next_id: RawHandle,
    entries: HashMap<RawHandle, Entry>,
}

enum Entry {
    Run(RunData),
    Timer(Box<TimerData>),
}

#[derive(Debug, Clone, Default)]
struct SegmentData {
    name: String,
    personal_best_split_time: Time,
    best_segment_time: Time,
    split_time: Time,
}

#[derive(Debug, Clone, Default)]
struct RunData {
    game_name: String,
    category_name: String,
    attempt_count: u32,
    segments: Vec<SegmentData>,
    custom_comparisons: Vec<String>,
    custom_variables: BTreeMap<String, String>,
    has_been_modified: bool,
}

struct TimerData {
    run: RunData,
    phase: TimerPhase,
    current_split_index: Option<usize>,
    current_comparison: String,
    timing_method: TimingMethod,
    start_time: TimeSpan,
    pause_started: Option<TimeSpan>,
    pause_time: TimeSpan,
    is_game_time_initialized: bool,
    game_time_paused_at: Option<TimeSpan>,
    loading_times: TimeSpan,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            clock,
        }
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEngine")
            .field("live_handles", &self.live_handles())
            .finish()
    }
}

impl Table {
    fn insert(&mut self, entry: Entry) -> RawHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.insert(id, entry);
        id
    }

    fn remove(&mut self, id: RawHandle) -> Entry {
        match self.entries.remove(&id) {
            Some(entry) => entry,
            None => panic!("handle {id} is not allocated"),
        }
    }

    fn run(&mut self, id: RawHandle) -> &mut RunData {
        match self.entries.get_mut(&id) {
            Some(Entry::Run(run)) => run,
            Some(Entry::Timer(_)) => panic!("handle {id} is a timer, not a run"),
            None => panic!("run handle {id} is not allocated"),
        }
    }

    fn timer(&mut self, id: RawHandle) -> &mut TimerData {
        match self.entries.get_mut(&id) {
            Some(Entry::Timer(timer)) => timer,
            Some(Entry::Run(_)) => panic!("handle {id} is a run, not a timer"),
            None => panic!("timer handle {id} is not allocated"),
        }
    }

    fn take_run(&mut self, id: RawHandle) -> RunData {
        match self.remove(id) {
            Entry::Run(run) => run,
            Entry::Timer(_) => panic!("handle {id} is a timer, not a run"),
        }
    }
}

impl RunData {
    fn info(&self) -> RunInfo {
        RunInfo {
            game_name: self.game_name.clone(),
            category_name: self.category_name.clone(),
            attempt_count: self.attempt_count,
            segments: self
                .segments
                .iter()
                .map(|s| SegmentInfo {
                    name: s.name.clone(),
                    personal_best_split_time: s.personal_best_split_time,
                    best_segment_time: s.best_segment_time,
                    split_time: s.split_time,
                })
                .collect(),
            custom_comparisons: self.custom_comparisons.clone(),
            custom_variables: self.custom_variables.clone(),
            has_been_modified: self.has_been_modified,
        }
    }

    fn comparisons(&self) -> Vec<String> {
        let mut all = vec![
            PERSONAL_BEST_COMPARISON.to_string(),
            BEST_SEGMENTS_COMPARISON.to_string(),
        ];
        all.extend(self.custom_comparisons.iter().cloned());
        all
    }

    fn has_comparison(&self, name: &str) -> bool {
        name == PERSONAL_BEST_COMPARISON
            || name == BEST_SEGMENTS_COMPARISON
            || self.custom_comparisons.iter().any(|c| c == name)
    }

    fn clear_attempt(&mut self) {
        for segment in &mut self.segments {
            segment.split_time = Time::default();
        }
    }

    /// Duration of segment `index` in the current attempt, if both its split
    /// and the preceding split were recorded.
    fn segment_time(&self, index: usize, method: TimingMethod) -> Option<TimeSpan> {
        let end = self.segments[index].split_time.get(method)?;
        let start = match index {
            0 => TimeSpan::zero(),
            _ => self.segments[index - 1].split_time.get(method)?,
        };
        Some(end - start)
    }

    fn final_split(&self, method: TimingMethod) -> Option<TimeSpan> {
        self.segments.last()?.split_time.get(method)
    }

    fn final_personal_best(&self, method: TimingMethod) -> Option<TimeSpan> {
        self.segments.last()?.personal_best_split_time.get(method)
    }

    fn improved_segments(&self) -> impl Iterator<Item = (usize, TimingMethod, TimeSpan)> + '_ {
        (0..self.segments.len()).flat_map(move |index| {
            METHODS.into_iter().filter_map(move |method| {
                let time = self.segment_time(index, method)?;
                match self.segments[index].best_segment_time.get(method) {
                    Some(best) if best <= time => None,
                    _ => Some((index, method, time)),
                }
            })
        })
    }

    fn beats_personal_best(&self, method: TimingMethod) -> bool {
        match (self.final_split(method), self.final_personal_best(method)) {
            (Some(attempt), Some(pb)) => attempt < pb,
            (Some(_), None) => true,
            _ => false,
        }
    }

    fn has_new_best_times(&self, method: TimingMethod) -> bool {
        self.improved_segments().next().is_some() || self.beats_personal_best(method)
    }

    fn save_attempt(&mut self, method: TimingMethod) {
        let improved: Vec<_> = self.improved_segments().collect();
        for (index, timing, time) in improved {
            self.segments[index].best_segment_time.set(timing, Some(time));
            self.has_been_modified = true;
        }
        if self.beats_personal_best(method) {
            for segment in &mut self.segments {
                segment.personal_best_split_time = segment.split_time;
            }
            self.has_been_modified = true;
        }
    }
}

impl TimerData {
    fn new(run: RunData) -> Self {
        Self {
            run,
            phase: TimerPhase::NotRunning,
            current_split_index: None,
            current_comparison: PERSONAL_BEST_COMPARISON.to_string(),
            timing_method: TimingMethod::RealTime,
            start_time: TimeSpan::zero(),
            pause_started: None,
            pause_time: TimeSpan::zero(),
            is_game_time_initialized: false,
            game_time_paused_at: None,
            loading_times: TimeSpan::zero(),
        }
    }

    fn real_time(&self, now: TimeSpan) -> TimeSpan {
        match self.phase {
            TimerPhase::NotRunning => TimeSpan::zero(),
            TimerPhase::Paused => {
                self.pause_started.unwrap_or(now) - self.start_time - self.pause_time
            }
            TimerPhase::Running | TimerPhase::Ended => now - self.start_time - self.pause_time,
        }
    }

    fn game_time(&self, now: TimeSpan) -> Option<TimeSpan> {
        if !self.is_game_time_initialized {
            return None;
        }
        Some(
            self.game_time_paused_at
                .unwrap_or_else(|| self.real_time(now) - self.loading_times),
        )
    }

    fn current_time(&self, now: TimeSpan) -> Time {
        match self.phase {
            TimerPhase::NotRunning => Time {
                real_time: Some(TimeSpan::zero()),
                game_time: Some(TimeSpan::zero()),
            },
            TimerPhase::Ended => self
                .run
                .segments
                .last()
                .map(|s| s.split_time)
                .unwrap_or_default(),
            TimerPhase::Running | TimerPhase::Paused => Time {
                real_time: Some(self.real_time(now)),
                game_time: self.game_time(now),
            },
        }
    }

    fn clear_attempt_state(&mut self) {
        self.phase = TimerPhase::NotRunning;
        self.current_split_index = None;
        self.pause_started = None;
        self.pause_time = TimeSpan::zero();
        self.is_game_time_initialized = false;
        self.game_time_paused_at = None;
        self.loading_times = TimeSpan::zero();
        self.run.clear_attempt();
    }

    fn require_in_progress(&self) -> Result<(), CommandError> {
        match self.phase {
            TimerPhase::NotRunning => Err(CommandError::NoRunInProgress),
            TimerPhase::Ended => Err(CommandError::RunFinished),
            TimerPhase::Running | TimerPhase::Paused => Ok(()),
        }
    }

    fn start(&mut self, now: TimeSpan) -> CommandResult {
        if self.phase != TimerPhase::NotRunning {
            return Err(CommandError::RunAlreadyInProgress);
        }
        self.clear_attempt_state();
        self.phase = TimerPhase::Running;
        self.current_split_index = Some(0);
        self.start_time = now;
        self.run.has_been_modified = true;
        Ok(Event::Started)
    }

    fn split(&mut self, now: TimeSpan) -> CommandResult {
        match self.phase {
            TimerPhase::NotRunning => return Err(CommandError::NoRunInProgress),
            TimerPhase::Paused => return Err(CommandError::TimerPaused),
            TimerPhase::Ended => return Err(CommandError::RunFinished),
            TimerPhase::Running => {}
        }
        let index = self.current_split_index.unwrap_or(0);
        let time = self.current_time(now);
        self.run.segments[index].split_time = time;
        let next = index + 1;
        self.current_split_index = Some(next);
        if next == self.run.segments.len() {
            self.phase = TimerPhase::Ended;
            Ok(Event::Finished)
        } else {
            Ok(Event::Splitted)
        }
    }

    fn undo_split(&mut self) -> CommandResult {
        if self.phase == TimerPhase::NotRunning {
            return Err(CommandError::NoRunInProgress);
        }
        let index = self.current_split_index.unwrap_or(0);
        if index == 0 {
            return Err(CommandError::CantUndoFirstSplit);
        }
        if self.phase == TimerPhase::Ended {
            self.phase = TimerPhase::Running;
        }
        let previous = index - 1;
        self.current_split_index = Some(previous);
        self.run.segments[previous].split_time = Time::default();
        Ok(Event::SplitUndone)
    }

    fn skip_split(&mut self) -> CommandResult {
        self.require_in_progress()?;
        let index = self.current_split_index.unwrap_or(0);
        if index + 1 >= self.run.segments.len() {
            return Err(CommandError::CantSkipLastSplit);
        }
        self.run.segments[index].split_time = Time::default();
        self.current_split_index = Some(index + 1);
        Ok(Event::SplitSkipped)
    }

    fn reset(&mut self, save_attempt: bool) -> CommandResult {
        if self.phase == TimerPhase::NotRunning {
            return Err(CommandError::NoRunInProgress);
        }
        if save_attempt {
            self.run.save_attempt(self.timing_method);
        }
        self.run.attempt_count += 1;
        self.clear_attempt_state();
        Ok(Event::Reset)
    }

    fn pause(&mut self, now: TimeSpan) -> CommandResult {
        match self.phase {
            TimerPhase::Running => {
                self.phase = TimerPhase::Paused;
                self.pause_started = Some(now);
                Ok(Event::Paused)
            }
            TimerPhase::Paused => Err(CommandError::AlreadyPaused),
            TimerPhase::NotRunning => Err(CommandError::NoRunInProgress),
            TimerPhase::Ended => Err(CommandError::RunFinished),
        }
    }

    fn resume(&mut self, now: TimeSpan) -> CommandResult {
        match self.phase {
            TimerPhase::Paused => {
                let started = self.pause_started.take().unwrap_or(now);
                self.pause_time += now - started;
                self.phase = TimerPhase::Running;
                Ok(Event::Resumed)
            }
            TimerPhase::Running => Err(CommandError::NotPaused),
            TimerPhase::NotRunning => Err(CommandError::NoRunInProgress),
            TimerPhase::Ended => Err(CommandError::RunFinished),
        }
    }

    fn toggle_pause_or_start(&mut self, now: TimeSpan) -> CommandResult {
        match self.phase {
            TimerPhase::Running => self.pause(now),
            TimerPhase::Paused => self.resume(now),
            TimerPhase::NotRunning => self.start(now),
            TimerPhase::Ended => Err(CommandError::RunFinished),
        }
    }

    fn undo_all_pauses(&mut self, now: TimeSpan) -> CommandResult {
        self.require_in_progress()?;
        let event = if self.phase == TimerPhase::Paused {
            self.resume(now)?;
            Event::PausesUndoneAndResumed
        } else {
            Event::PausesUndone
        };
        self.pause_time = TimeSpan::zero();
        Ok(event)
    }

    fn switch_comparison(&mut self, step: isize) -> CommandResult {
        let all = self.run.comparisons();
        let len = all.len() as isize;
        let current = all
            .iter()
            .position(|c| *c == self.current_comparison)
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len) as usize;
        self.current_comparison = all[next].clone();
        Ok(Event::ComparisonChanged)
    }

    fn set_current_comparison(&mut self, name: &str) -> CommandResult {
        if !self.run.has_comparison(name) {
            return Err(CommandError::ComparisonDoesntExist);
        }
        self.current_comparison = name.to_string();
        Ok(Event::ComparisonChanged)
    }

    fn initialize_game_time(&mut self) -> CommandResult {
        if self.is_game_time_initialized {
            return Err(CommandError::GameTimeAlreadyInitialized);
        }
        self.is_game_time_initialized = true;
        Ok(Event::GameTimeInitialized)
    }

    fn set_game_time(&mut self, time: TimeSpan, now: TimeSpan) -> CommandResult {
        if time.is_negative() {
            return Err(CommandError::NegativeTime);
        }
        self.require_in_progress()?;
        self.loading_times = self.real_time(now) - time;
        if self.game_time_paused_at.is_some() {
            self.game_time_paused_at = Some(time);
        }
        self.is_game_time_initialized = true;
        Ok(Event::GameTimeSet)
    }

    fn pause_game_time(&mut self, now: TimeSpan) -> CommandResult {
        if self.game_time_paused_at.is_some() {
            return Err(CommandError::GameTimeAlreadyPaused);
        }
        self.game_time_paused_at = Some(self.real_time(now) - self.loading_times);
        Ok(Event::GameTimePaused)
    }

    fn resume_game_time(&mut self, now: TimeSpan) -> CommandResult {
        let Some(frozen) = self.game_time_paused_at.take() else {
            return Err(CommandError::GameTimeNotPaused);
        };
        self.loading_times = self.real_time(now) - frozen;
        Ok(Event::GameTimeResumed)
    }

    fn set_loading_times(&mut self, time: TimeSpan, now: TimeSpan) -> CommandResult {
        if time.is_negative() {
            return Err(CommandError::NegativeTime);
        }
        self.require_in_progress()?;
        self.loading_times = time;
        if self.game_time_paused_at.is_some() {
            self.game_time_paused_at = Some(self.real_time(now) - time);
        }
        Ok(Event::LoadingTimesSet)
    }

    fn execute(&mut self, command: &Command, now: TimeSpan) -> CommandResult {
        match command {
            Command::Start => self.start(now),
            Command::Split => self.split(now),
            Command::SplitOrStart => match self.phase {
                TimerPhase::NotRunning => self.start(now),
                _ => self.split(now),
            },
            Command::Reset { save_attempt } => self.reset(save_attempt.unwrap_or(true)),
            Command::UndoSplit => self.undo_split(),
            Command::SkipSplit => self.skip_split(),
            Command::TogglePauseOrStart => self.toggle_pause_or_start(now),
            Command::Pause => self.pause(now),
            Command::Resume => self.resume(now),
            Command::UndoAllPauses => self.undo_all_pauses(now),
            Command::SwitchToPreviousComparison => self.switch_comparison(-1),
            Command::SwitchToNextComparison => self.switch_comparison(1),
            Command::SetCurrentComparison { comparison } => self.set_current_comparison(comparison),
            Command::ToggleTimingMethod => {
                self.timing_method = self.timing_method.toggled();
                Ok(Event::TimingMethodChanged)
            }
            Command::SetCurrentTimingMethod { timing_method } => {
                self.timing_method = *timing_method;
                Ok(Event::TimingMethodChanged)
            }
            Command::InitializeGameTime => self.initialize_game_time(),
            Command::SetGameTime { time } => self.set_game_time(*time, now),
            Command::PauseGameTime => self.pause_game_time(now),
            Command::ResumeGameTime => self.resume_game_time(now),
            Command::SetLoadingTimes { time } => self.set_loading_times(*time, now),
            Command::SetCustomVariable { key, value } => {
                self.run.custom_variables.insert(key.clone(), value.clone());
                Ok(Event::CustomVariableSet)
            }
        }
    }

    fn snapshot(&self, now: TimeSpan) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            current_time: self.current_time(now),
            current_split_index: self.current_split_index,
            current_comparison: self.current_comparison.clone(),
            comparisons: self.run.comparisons(),
            current_timing_method: self.timing_method,
            is_game_time_initialized: self.is_game_time_initialized,
            is_game_time_paused: self.game_time_paused_at.is_some(),
            loading_times: self.loading_times,
            run: self.run.info(),
        }
    }
}

impl Engine for LocalEngine {
    fn run_new(&self) -> RawHandle {
        let id = self.table().insert(Entry::Run(RunData::default()));
        trace!(id, "run allocated");
        id
    }

    fn run_clone(&self, run: RawHandle) -> RawHandle {
        let mut table = self.table();
        let copy = table.run(run).clone();
        table.insert(Entry::Run(copy))
    }

    fn run_drop(&self, run: RawHandle) {
        self.table().take_run(run);
        trace!(id = run, "run dropped");
    }

    fn run_push_segment(&self, run: RawHandle, name: &str) {
        let mut table = self.table();
        let run = table.run(run);
        run.segments.push(SegmentData {
            name: name.to_string(),
            ..SegmentData::default()
        });
        run.has_been_modified = true;
    }

    fn run_set_game_name(&self, run: RawHandle, name: &str) {
        let mut table = self.table();
        let run = table.run(run);
        run.game_name = name.to_string();
        run.has_been_modified = true;
    }

    fn run_set_category_name(&self, run: RawHandle, name: &str) {
        let mut table = self.table();
        let run = table.run(run);
        run.category_name = name.to_string();
        run.has_been_modified = true;
    }

    fn run_add_custom_comparison(&self, run: RawHandle, name: &str) -> bool {
        let mut table = self.table();
        let run = table.run(run);
        if run.has_comparison(name) {
            return false;
        }
        run.custom_comparisons.push(name.to_string());
        run.has_been_modified = true;
        true
    }

    fn run_info(&self, run: RawHandle) -> RunInfo {
        self.table().run(run).info()
    }

    fn timer_new(&self, run: RawHandle) -> RawHandle {
        let mut table = self.table();
        if table.run(run).segments.is_empty() {
            return NULL_HANDLE;
        }
        let run_data = table.take_run(run);
        let id = table.insert(Entry::Timer(Box::new(TimerData::new(run_data))));
        trace!(id, run, "timer allocated");
        id
    }

    fn timer_drop(&self, timer: RawHandle) {
        match self.table().remove(timer) {
            Entry::Timer(_) => trace!(id = timer, "timer dropped"),
            Entry::Run(_) => panic!("handle {timer} is a run, not a timer"),
        }
    }

    fn timer_execute(&self, timer: RawHandle, command: &Command) -> CommandResult {
        let now = self.clock.now();
        self.table().timer(timer).execute(command, now)
    }

    fn timer_set_run(&self, timer: RawHandle, run: RawHandle) -> RawHandle {
        let mut table = self.table();
        if table.run(run).segments.is_empty() {
            return NULL_HANDLE;
        }
        let incoming = table.take_run(run);
        let timer = table.timer(timer);
        timer.clear_attempt_state();
        let mut previous = std::mem::replace(&mut timer.run, incoming);
        previous.clear_attempt();
        if !timer.run.has_comparison(&timer.current_comparison) {
            timer.current_comparison = PERSONAL_BEST_COMPARISON.to_string();
        }
        table.insert(Entry::Run(previous))
    }

    fn timer_snapshot(&self, timer: RawHandle) -> TimerSnapshot {
        let now = self.clock.now();
        self.table().timer(timer).snapshot(now)
    }

    fn timer_current_phase(&self, timer: RawHandle) -> TimerPhase {
        self.table().timer(timer).phase
    }

    fn timer_current_time(&self, timer: RawHandle) -> Time {
        let now = self.clock.now();
        self.table().timer(timer).current_time(now)
    }

    fn timer_current_attempt_has_new_best_times(&self, timer: RawHandle) -> bool {
        let mut table = self.table();
        let timer = table.timer(timer);
        timer.phase != TimerPhase::NotRunning && timer.run.has_new_best_times(timer.timing_method)
    }

    fn timer_mark_as_unmodified(&self, timer: RawHandle) {
        self.table().timer(timer).run.has_been_modified = false;
    }

    fn live_handles(&self) -> usize {
        self.table().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ManualClock;

    fn engine_with_clock() -> (LocalEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (LocalEngine::with_clock(clock.clone()), clock)
    }

    fn timer_with_segments(engine: &LocalEngine, names: &[&str]) -> RawHandle {
        let run = engine.run_new();
        for name in names {
            engine.run_push_segment(run, name);
        }
        engine.timer_new(run)
    }

    #[test]
    fn test_empty_run_is_rejected_and_kept() {
        let engine = LocalEngine::new();
        let run = engine.run_new();
        assert_eq!(engine.timer_new(run), NULL_HANDLE);
        assert_eq!(engine.live_handles(), 1);
        engine.run_drop(run);
        assert_eq!(engine.live_handles(), 0);
    }

    #[test]
    fn test_timer_consumes_run() {
        let engine = LocalEngine::new();
        let timer = timer_with_segments(&engine, &["a"]);
        assert_ne!(timer, NULL_HANDLE);
        assert_eq!(engine.live_handles(), 1);
    }

    #[test]
    fn test_phase_transitions() {
        let (engine, clock) = engine_with_clock();
        let timer = timer_with_segments(&engine, &["a", "b"]);

        assert_eq!(engine.timer_execute(timer, &Command::Split), Err(CommandError::NoRunInProgress));
        assert_eq!(engine.timer_execute(timer, &Command::Start), Ok(Event::Started));
        assert_eq!(
            engine.timer_execute(timer, &Command::Start),
            Err(CommandError::RunAlreadyInProgress)
        );
        clock.advance(TimeSpan::from_millis(1_000));
        assert_eq!(engine.timer_execute(timer, &Command::Pause), Ok(Event::Paused));
        assert_eq!(engine.timer_execute(timer, &Command::Split), Err(CommandError::TimerPaused));
        clock.advance(TimeSpan::from_millis(5_000));
        assert_eq!(engine.timer_execute(timer, &Command::Resume), Ok(Event::Resumed));
        assert_eq!(
            engine.timer_current_time(timer).real_time,
            Some(TimeSpan::from_millis(1_000))
        );
        assert_eq!(engine.timer_execute(timer, &Command::Split), Ok(Event::Splitted));
        assert_eq!(engine.timer_execute(timer, &Command::Split), Ok(Event::Finished));
        assert_eq!(engine.timer_current_phase(timer), TimerPhase::Ended);
        assert_eq!(engine.timer_execute(timer, &Command::Split), Err(CommandError::RunFinished));
        assert_eq!(engine.timer_execute(timer, &Command::UndoSplit), Ok(Event::SplitUndone));
        assert_eq!(engine.timer_current_phase(timer), TimerPhase::Running);
    }

    #[test]
    fn test_skip_and_undo_bounds() {
        let engine = LocalEngine::new();
        let timer = timer_with_segments(&engine, &["a", "b"]);
        engine.timer_execute(timer, &Command::Start).unwrap();
        assert_eq!(
            engine.timer_execute(timer, &Command::UndoSplit),
            Err(CommandError::CantUndoFirstSplit)
        );
        assert_eq!(engine.timer_execute(timer, &Command::SkipSplit), Ok(Event::SplitSkipped));
        assert_eq!(
            engine.timer_execute(timer, &Command::SkipSplit),
            Err(CommandError::CantSkipLastSplit)
        );
    }

    #[test]
    fn test_undo_all_pauses_resumes() {
        let (engine, clock) = engine_with_clock();
        let timer = timer_with_segments(&engine, &["a"]);
        engine.timer_execute(timer, &Command::Start).unwrap();
        clock.advance(TimeSpan::from_millis(100));
        engine.timer_execute(timer, &Command::Pause).unwrap();
        clock.advance(TimeSpan::from_millis(400));
        assert_eq!(
            engine.timer_execute(timer, &Command::UndoAllPauses),
            Ok(Event::PausesUndoneAndResumed)
        );
        assert_eq!(
            engine.timer_current_time(timer).real_time,
            Some(TimeSpan::from_millis(500))
        );
        assert_eq!(engine.timer_execute(timer, &Command::UndoAllPauses), Ok(Event::PausesUndone));
    }

    #[test]
    fn test_comparisons_cycle() {
        let engine = LocalEngine::new();
        let run = engine.run_new();
        engine.run_push_segment(run, "a");
        assert!(engine.run_add_custom_comparison(run, "Average"));
        assert!(!engine.run_add_custom_comparison(run, "Average"));
        assert!(!engine.run_add_custom_comparison(run, PERSONAL_BEST_COMPARISON));
        let timer = engine.timer_new(run);

        engine.timer_execute(timer, &Command::SwitchToPreviousComparison).unwrap();
        assert_eq!(engine.timer_snapshot(timer).current_comparison, "Average");
        engine.timer_execute(timer, &Command::SwitchToNextComparison).unwrap();
        assert_eq!(
            engine.timer_snapshot(timer).current_comparison,
            PERSONAL_BEST_COMPARISON
        );
        assert_eq!(
            engine.timer_execute(
                timer,
                &Command::SetCurrentComparison {
                    comparison: "Nope".into()
                }
            ),
            Err(CommandError::ComparisonDoesntExist)
        );
    }

    #[test]
    fn test_game_time_follows_loading_times() {
        let (engine, clock) = engine_with_clock();
        let timer = timer_with_segments(&engine, &["a"]);
        assert_eq!(
            engine.timer_execute(timer, &Command::SetGameTime { time: TimeSpan::zero() }),
            Err(CommandError::NoRunInProgress)
        );
        engine.timer_execute(timer, &Command::Start).unwrap();
        assert_eq!(engine.timer_current_time(timer).game_time, None);
        engine.timer_execute(timer, &Command::InitializeGameTime).unwrap();
        assert_eq!(
            engine.timer_execute(timer, &Command::InitializeGameTime),
            Err(CommandError::GameTimeAlreadyInitialized)
        );
        clock.advance(TimeSpan::from_millis(10_000));
        engine
            .timer_execute(timer, &Command::SetLoadingTimes { time: TimeSpan::from_millis(2_000) })
            .unwrap();
        assert_eq!(
            engine.timer_current_time(timer).game_time,
            Some(TimeSpan::from_millis(8_000))
        );

        engine.timer_execute(timer, &Command::PauseGameTime).unwrap();
        assert_eq!(
            engine.timer_execute(timer, &Command::PauseGameTime),
            Err(CommandError::GameTimeAlreadyPaused)
        );
        clock.advance(TimeSpan::from_millis(3_000));
        assert_eq!(
            engine.timer_current_time(timer).game_time,
            Some(TimeSpan::from_millis(8_000))
        );
        engine.timer_execute(timer, &Command::ResumeGameTime).unwrap();
        assert_eq!(
            engine.timer_execute(timer, &Command::ResumeGameTime),
            Err(CommandError::GameTimeNotPaused)
        );
        clock.advance(TimeSpan::from_millis(1_000));
        assert_eq!(
            engine.timer_current_time(timer).game_time,
            Some(TimeSpan::from_millis(9_000))
        );
        assert_eq!(
            engine.timer_execute(timer, &Command::SetGameTime { time: TimeSpan::from_millis(-1) }),
            Err(CommandError::NegativeTime)
        );
    }

    #[test]
    fn test_reset_saves_best_times_only_when_asked() {
        let (engine, clock) = engine_with_clock();
        let timer = timer_with_segments(&engine, &["a"]);

        engine.timer_execute(timer, &Command::Start).unwrap();
        assert!(!engine.timer_current_attempt_has_new_best_times(timer));
        clock.advance(TimeSpan::from_millis(60_000));
        engine.timer_execute(timer, &Command::Split).unwrap();
        assert!(engine.timer_current_attempt_has_new_best_times(timer));
        engine
            .timer_execute(timer, &Command::Reset { save_attempt: Some(false) })
            .unwrap();
        let info = engine.run_info_of_timer(timer);
        assert_eq!(info.attempt_count, 1);
        assert_eq!(info.segments[0].best_segment_time.real_time, None);

        engine.timer_execute(timer, &Command::Start).unwrap();
        clock.advance(TimeSpan::from_millis(50_000));
        engine.timer_execute(timer, &Command::Split).unwrap();
        engine
            .timer_execute(timer, &Command::Reset { save_attempt: Some(true) })
            .unwrap();
        let info = engine.run_info_of_timer(timer);
        assert_eq!(info.attempt_count, 2);
        assert_eq!(
            info.segments[0].best_segment_time.real_time,
            Some(TimeSpan::from_millis(50_000))
        );
        assert_eq!(
            info.segments[0].personal_best_split_time.real_time,
            Some(TimeSpan::from_millis(50_000))
        );

        engine.timer_execute(timer, &Command::Start).unwrap();
        clock.advance(TimeSpan::from_millis(55_000));
        engine.timer_execute(timer, &Command::Split).unwrap();
        assert!(!engine.timer_current_attempt_has_new_best_times(timer));
    }

    #[test]
    fn test_set_run_returns_previous_and_discards_attempt() {
        let engine = LocalEngine::new();
        let timer = timer_with_segments(&engine, &["a"]);
        engine
            .timer_execute(timer, &Command::SetCurrentComparison { comparison: BEST_SEGMENTS_COMPARISON.into() })
            .unwrap();
        engine.timer_execute(timer, &Command::Start).unwrap();

        let empty = engine.run_new();
        assert_eq!(engine.timer_set_run(timer, empty), NULL_HANDLE);
        assert_eq!(engine.timer_current_phase(timer), TimerPhase::Running);
        engine.run_drop(empty);

        let next = engine.run_new();
        engine.run_push_segment(next, "x");
        engine.run_push_segment(next, "y");
        let previous = engine.timer_set_run(timer, next);
        assert_ne!(previous, NULL_HANDLE);
        assert_eq!(engine.run_info(previous).segments.len(), 1);
        let snapshot = engine.timer_snapshot(timer);
        assert_eq!(snapshot.phase, TimerPhase::NotRunning);
        assert_eq!(snapshot.run.segments.len(), 2);
        assert_eq!(snapshot.current_comparison, BEST_SEGMENTS_COMPARISON);
        assert_eq!(engine.live_handles(), 2);
    }

    #[test]
    #[should_panic(expected = "timer handle 42 is not allocated")]
    fn test_unknown_handle_panics() {
        LocalEngine::new().timer_current_phase(42);
    }

    impl LocalEngine {
        fn run_info_of_timer(&self, timer: RawHandle) -> RunInfo {
            self.timer_snapshot(timer).run
        }
    }
}
