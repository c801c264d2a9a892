//! Candidate routines for the chosen duration and which one is selected.

use std::fmt;

use shared::{
    domain::{DurationChoice, RoutineId},
    protocol::{ExerciseDescriptor, RoutineCandidate},
};

#[derive(Debug, Default, Clone)]
pub struct RoutineBoard {
    duration: Option<DurationChoice>,
    candidates: Vec<RoutineCandidate>,
    selected: Option<RoutineId>,
}

impl RoutineBoard {
    pub fn duration(&self) -> Option<DurationChoice> {
        self.duration
    }

    pub fn candidates(&self) -> &[RoutineCandidate] {
        &self.candidates
    }

    pub fn selected(&self) -> Option<&RoutineCandidate> {
        let id = self.selected.as_ref()?;
        self.candidates.iter().find(|candidate| &candidate.id == id)
    }

    pub fn load(&mut self, duration: DurationChoice, candidates: Vec<RoutineCandidate>) {
        self.duration = Some(duration);
        self.candidates = candidates;
        self.selected = None;
    }

    /// A failed fetch still leaves the time-selection screen, with no cards.
    pub fn load_failed(&mut self, duration: DurationChoice) {
        self.load(duration, Vec::new());
    }

    /// Selects an unselected card. Once a card is selected further clicks are
    /// ignored until `clear_selection`.
    pub fn select(&mut self, id: RoutineId) -> Option<RoutineCandidate> {
        if self.selected.is_some() {
            return None;
        }
        let candidate = self.candidates.iter().find(|c| c.id == id)?.clone();
        self.selected = Some(id);
        Some(candidate)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Cards to render: every candidate, or only the selected one. The
    /// exercise at `highlight` is marked as the one being coached.
    pub fn cards(&self, highlight: Option<u32>) -> Vec<CardView> {
        match self.selected() {
            Some(candidate) => vec![CardView::new(candidate, true, highlight)],
            None => self
                .candidates
                .iter()
                .map(|candidate| CardView::new(candidate, false, None))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub routine_id: RoutineId,
    pub title: String,
    pub total_time_min: f64,
    pub total_calories: f64,
    pub score: Option<f64>,
    pub selected: bool,
    pub exercises: Vec<ExerciseLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseLine {
    pub position: usize,
    pub name: String,
    pub detail: String,
    pub highlighted: bool,
}

impl CardView {
    fn new(candidate: &RoutineCandidate, selected: bool, highlight: Option<u32>) -> Self {
        let exercises = candidate
            .exercises
            .iter()
            .enumerate()
            .map(|(idx, exercise)| ExerciseLine {
                position: idx + 1,
                name: exercise.name.clone(),
                detail: exercise_detail(exercise),
                highlighted: highlight.is_some_and(|h| h as usize == idx),
            })
            .collect();
        Self {
            routine_id: candidate.id.clone(),
            title: candidate.strategy.label().to_string(),
            total_time_min: candidate.total_time_min,
            total_calories: candidate.total_calories,
            score: candidate.score,
            selected,
            exercises,
        }
    }
}

fn exercise_detail(exercise: &ExerciseDescriptor) -> String {
    let mut parts = Vec::new();
    if let Some(category) = &exercise.category {
        parts.push(category.clone());
    }
    parts.push(format!("{} sets x {} reps", exercise.sets, exercise.reps));
    if let Some(duration) = exercise.duration_sec {
        parts.push(format!("{duration}s per set"));
    }
    parts.push(format!("rest {}s", exercise.rest_sec));
    parts.join(" · ")
}

impl fmt::Display for CardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.selected { "*" } else { " " };
        writeln!(f, "{marker}[{}] {}", self.routine_id, self.title)?;
        write!(
            f,
            "    {:.0} min · {:.0} kcal",
            self.total_time_min, self.total_calories
        )?;
        if let Some(score) = self.score {
            write!(f, " · score {score:.1}")?;
        }
        writeln!(f)?;
        for line in &self.exercises {
            let cursor = if line.highlighted { ">" } else { " " };
            writeln!(f, "  {cursor} {}. {} ({})", line.position, line.name, line.detail)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/routine_board_tests.rs"]
mod tests;
