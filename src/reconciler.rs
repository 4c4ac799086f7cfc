//! Backend sync reconciler.
//!
//! The food/doneness selectors are edited locally by the user and remotely
//! by the device. [`BackendSync`] detects genuine backend selection changes
//! so the selectors are only rewritten when the device actually changed
//! them, never on temperature-only telemetry ticks that would clobber an
//! edit in progress. [`SelectorSet`] holds the selector state itself and
//! turns user edits into device commands.

use tracing::{debug, info, warn};

use crate::data::food::{food_type, FoodReference, MANUAL};
use crate::data::snapshot::DeviceSnapshot;
use crate::error::{Error, Result};
use crate::source::commands::Command;

/// Manual target used when the target field is empty.
pub const DEFAULT_MANUAL_TARGET: f64 = 60.0;

/// Last observed backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackendSelection {
    /// Food category.
    pub category: Option<String>,
    /// Combined food type, e.g. `"beef_steak"`.
    pub food: Option<String>,
    /// Doneness.
    pub doneness: Option<String>,
    /// Manual target mode.
    pub is_manual: bool,
}

impl BackendSelection {
    /// Extract the selection fields of a snapshot.
    pub fn from_snapshot(snapshot: &DeviceSnapshot) -> Self {
        Self {
            category: snapshot.food_category.clone(),
            food: snapshot.food_type.clone(),
            doneness: snapshot.doneness.clone(),
            is_manual: snapshot.is_manual_mode,
        }
    }
}

/// Change detector for the backend selection.
#[derive(Debug, Clone, Default)]
pub struct BackendSync {
    baseline: Option<BackendSelection>,
}

impl BackendSync {
    /// Create a detector with no baseline; the first snapshot is a change.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the backend selection changed since the last detected change.
    ///
    /// Compares category, food, doneness and manual mode for strict
    /// equality. The baseline is updated only when something differs, so
    /// repeated calls with the same selection return `false`.
    pub fn has_backend_changed(&mut self, snapshot: &DeviceSnapshot) -> bool {
        let current = BackendSelection::from_snapshot(snapshot);
        if self.baseline.as_ref() == Some(&current) {
            return false;
        }

        debug!(
            "Backend selection changed: {:?} -> {:?}",
            self.baseline, current
        );
        self.baseline = Some(current);
        true
    }

    /// The last detected selection.
    pub fn baseline(&self) -> Option<&BackendSelection> {
        self.baseline.as_ref()
    }

    /// Forget the baseline so the next snapshot counts as a change.
    pub fn reset(&mut self) {
        self.baseline = None;
    }
}

/// One drop-down selector.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selector {
    /// Option values in display order.
    pub options: Vec<String>,
    /// Selected value, always one of `options`.
    pub selected: Option<String>,
    /// Whether the user can change it.
    pub disabled: bool,
}

impl Selector {
    fn placeholder() -> Self {
        Self {
            options: vec![MANUAL.to_string()],
            selected: Some(MANUAL.to_string()),
            disabled: true,
        }
    }

    fn populate<'a>(&mut self, options: impl Iterator<Item = &'a str>) {
        self.options = options.map(str::to_string).collect();
        self.selected = None;
        self.disabled = false;
    }

    /// Select a value. Returns `false` (and changes nothing) if it is not
    /// one of the options.
    pub fn select(&mut self, value: &str) -> bool {
        if !self.options.iter().any(|o| o == value) {
            return false;
        }
        self.selected = Some(value.to_string());
        true
    }

    /// The selected value.
    pub fn value(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

/// The category, food and doneness selectors plus the target field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectorSet {
    /// Category selector (includes the manual pseudo-category).
    pub category: Selector,
    /// Food selector.
    pub food: Selector,
    /// Doneness selector.
    pub doneness: Selector,
    /// Numeric target field in °C.
    pub target_input: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip, default))]
    foods: FoodReference,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self::new(FoodReference::builtin())
    }
}

impl SelectorSet {
    /// Create selectors over a food table, in the manual state.
    pub fn new(foods: FoodReference) -> Self {
        let mut category = Selector::default();
        category.populate(
            std::iter::once(MANUAL).chain(foods.categories().iter().map(|c| c.id)),
        );
        category.select(MANUAL);

        Self {
            category,
            food: Selector::placeholder(),
            doneness: Selector::placeholder(),
            target_input: None,
            foods,
        }
    }

    /// The food table behind the selectors.
    pub fn foods(&self) -> FoodReference {
        self.foods
    }

    fn set_manual(&mut self) {
        self.category.select(MANUAL);
        self.food = Selector::placeholder();
        self.doneness = Selector::placeholder();
    }

    // Dependent options are populated only after the parent is selected so a
    // selection is never made against a stale option list.
    fn set_food_options(&mut self, category: &str, food: Option<&str>) -> bool {
        if !self.category.select(category) {
            return false;
        }
        self.food
            .populate(self.foods.foods(category).iter().map(|f| f.id));
        match food {
            Some(food) => self.food.select(food),
            None => true,
        }
    }

    fn set_doneness_options(&mut self, category: &str, food: &str, doneness: Option<&str>) {
        self.doneness
            .populate(self.foods.doneness(category, food).iter().map(|d| d.id));
        if let Some(doneness) = doneness {
            if self.doneness.select(doneness) {
                if let Some(temp) = self.foods.temperature(category, food, doneness) {
                    self.target_input = Some(temp.round());
                }
            }
        }
    }

    /// Rewrite the selectors from a snapshot after a detected backend change.
    ///
    /// Manual mode disables all three selectors on the manual placeholder.
    /// Otherwise, when both category and food are known, the selectors are
    /// filled in order category → food → doneness and the target field is
    /// set from the food table. A selection missing from the food table
    /// leaves the category enabled on the manual placeholder.
    pub fn reconcile(&mut self, snapshot: &DeviceSnapshot) {
        if snapshot.is_manual_mode {
            debug!("Backend is in manual mode");
            self.set_manual();
            self.category.disabled = true;
            return;
        }

        let (category, food) = match (snapshot.food_category.as_deref(), snapshot.food()) {
            (Some(category), Some(food)) => (category, food),
            (category, food) => {
                debug!(
                    "Not syncing selectors: category {:?}, food {:?}",
                    category, food
                );
                return;
            }
        };

        self.category.disabled = false;
        if !self.set_food_options(category, Some(food)) {
            warn!("Backend selection {}/{} is not in the food table", category, food);
            self.set_manual();
            return;
        }
        self.set_doneness_options(category, food, snapshot.doneness.as_deref());
        info!(
            "Synced selectors to {}/{}/{:?}",
            category, food, snapshot.doneness
        );
    }

    /// Apply a user's category change.
    ///
    /// Picking the manual category dispatches the current target (or 60 °C);
    /// any other category selects its first food and that food's first
    /// doneness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for an unknown category or an
    /// out-of-range manual target.
    pub fn on_category_changed(&mut self, category: &str) -> Result<Command> {
        if category == MANUAL {
            self.set_manual();
            return Command::set_target_temp(self.target_input.unwrap_or(DEFAULT_MANUAL_TARGET));
        }

        let food = self
            .foods
            .first_food(category)
            .ok_or_else(|| invalid("category", category))?;
        self.category.disabled = false;
        self.set_food_options(category, Some(food.id));
        self.select_first_doneness(category, food.id)
    }

    /// Apply a user's food change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the food is not in the selected
    /// category.
    pub fn on_food_changed(&mut self, food: &str) -> Result<Command> {
        let category = self.category.value().unwrap_or(MANUAL).to_string();
        if self.foods.food(&category, food).is_none() || !self.food.select(food) {
            return Err(invalid("food", food));
        }
        self.select_first_doneness(&category, food)
    }

    /// Apply a user's doneness change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if no food is selected or the
    /// doneness is not offered for it.
    pub fn on_doneness_changed(&mut self, doneness: &str) -> Result<Command> {
        let category = self.category.value().unwrap_or(MANUAL).to_string();
        let food = self
            .food
            .value()
            .filter(|f| *f != MANUAL)
            .ok_or_else(|| invalid("doneness", doneness))?
            .to_string();
        if !self.doneness.select(doneness) {
            return Err(invalid("doneness", doneness));
        }
        if let Some(temp) = self.foods.temperature(&category, &food, doneness) {
            self.target_input = Some(temp.round());
        }

        Ok(Command::SetFood {
            food_type: food_type(&category, &food),
            doneness: doneness.to_string(),
        })
    }

    /// Apply a user's edit of the target field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] outside 30–100 °C; the field keeps
    /// its previous value and nothing is dispatched.
    pub fn on_target_edited(&mut self, celsius: f64) -> Result<Command> {
        let command = Command::set_target_temp(celsius)?;
        self.target_input = Some(celsius);
        Ok(command)
    }

    /// Show a backend-provided target in the field.
    pub fn show_target(&mut self, celsius: Option<f64>) {
        if let Some(celsius) = celsius {
            self.target_input = Some(celsius.round());
        }
    }

    fn select_first_doneness(&mut self, category: &str, food: &str) -> Result<Command> {
        let doneness = self
            .foods
            .first_doneness(category, food)
            .ok_or_else(|| invalid("food", food))?;
        self.set_doneness_options(category, food, Some(doneness.id));

        Ok(Command::SetFood {
            food_type: food_type(category, food),
            doneness: doneness.id.to_string(),
        })
    }
}

fn invalid(name: &str, value: &str) -> Error {
    Error::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    }
}
