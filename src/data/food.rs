//! Static food and doneness reference table.
//!
//! Maps category → food → doneness → target core temperature (°C).
//! Order is significant: the first food of a category and the first
//! doneness of a food are the defaults picked when the user changes the
//! parent selector.

/// Identifier of the manual (free temperature) pseudo-category.
pub const MANUAL: &str = "manual";

/// A named doneness preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Doneness {
    /// Doneness identifier, e.g. `"medium_rare"`.
    pub id: &'static str,
    /// Target core temperature in °C.
    pub temperature: f64,
}

/// A food with its doneness presets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Food {
    /// Food identifier, unique within its category, e.g. `"chicken_breast"`.
    pub id: &'static str,
    /// Available doneness presets, first is the default.
    pub doneness: &'static [Doneness],
}

/// A food category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Category {
    /// Category identifier, e.g. `"beef"`.
    pub id: &'static str,
    /// Foods in this category, first is the default.
    pub foods: &'static [Food],
}

const fn d(id: &'static str, temperature: f64) -> Doneness {
    Doneness { id, temperature }
}

const fn f(id: &'static str, doneness: &'static [Doneness]) -> Food {
    Food { id, doneness }
}

const STEAK_RANGE: &[Doneness] = &[
    d("rare", 52.0),
    d("medium_rare", 55.0),
    d("medium", 57.0),
    d("medium_well", 63.0),
    d("well_done", 68.0),
];

const TENDER_CUT: &[Doneness] = &[
    d("rare", 52.0),
    d("medium_rare", 55.0),
    d("medium", 57.0),
    d("medium_well", 63.0),
];

const POULTRY_DONE: &[Doneness] = &[d("done", 74.0)];

const LAMB_PINK: &[Doneness] = &[d("rare", 52.0), d("pink", 57.0), d("medium", 63.0)];

/// The built-in reference table.
pub static FOOD_DATABASE: &[Category] = &[
    Category {
        id: "beef",
        foods: &[
            f(
                "steak",
                &[
                    d("blue", 46.0),
                    d("rare", 52.0),
                    d("medium_rare", 55.0),
                    d("medium", 57.0),
                    d("medium_well", 63.0),
                    d("well_done", 68.0),
                ],
            ),
            f("roast", STEAK_RANGE),
            f("prime_rib", STEAK_RANGE),
            f("filet_mignon", TENDER_CUT),
            f("ribeye", STEAK_RANGE),
            f(
                "burger",
                &[d("medium", 63.0), d("well_done", 71.0), d("safe", 71.0)],
            ),
            f("brisket", &[d("pulled", 93.0)]),
            f("tenderloin", TENDER_CUT),
        ],
    },
    Category {
        id: "pork",
        foods: &[
            f("chop", &[d("medium", 63.0), d("well_done", 71.0)]),
            f("tenderloin", &[d("medium", 63.0), d("well_done", 68.0)]),
            f("roast", &[d("medium", 63.0), d("well_done", 71.0)]),
            f("ribs", &[d("tender", 88.0), d("fall_off_bone", 93.0)]),
            f("pulled_pork", &[d("pulled", 93.0)]),
            f("ham", &[d("reheated", 60.0)]),
            f("belly", &[d("tender", 77.0), d("very_tender", 85.0)]),
        ],
    },
    Category {
        id: "poultry",
        foods: &[
            f("chicken_whole", POULTRY_DONE),
            f("chicken_breast", POULTRY_DONE),
            f("chicken_thigh", &[d("done", 74.0), d("tender", 76.0)]),
            f("turkey_whole", POULTRY_DONE),
            f("turkey_breast", POULTRY_DONE),
            f("duck_breast", &[d("pink", 57.0), d("medium", 63.0)]),
            f("duck_leg_confit", &[d("confit", 82.0)]),
        ],
    },
    Category {
        id: "lamb",
        foods: &[
            f(
                "leg",
                &[
                    d("rare", 52.0),
                    d("pink", 57.0),
                    d("medium", 63.0),
                    d("well_done", 68.0),
                ],
            ),
            f("chops", LAMB_PINK),
            f("rack", LAMB_PINK),
            f("shank", &[d("braised", 85.0)]),
            f("shoulder", &[d("pulled", 88.0)]),
        ],
    },
    Category {
        id: "veal",
        foods: &[
            f("roast", &[d("medium", 63.0), d("well_done", 68.0)]),
            f("chop", &[d("medium", 63.0)]),
            f("cutlet", &[d("medium", 63.0)]),
        ],
    },
    Category {
        id: "fish",
        foods: &[
            f(
                "salmon",
                &[d("mi_cuit", 46.0), d("medium", 52.0), d("well_done", 60.0)],
            ),
            f("tuna", &[d("rare", 43.0), d("medium", 52.0)]),
            f("cod", &[d("medium", 55.0), d("well_done", 60.0)]),
            f("sea_bass", &[d("medium", 55.0)]),
            f("halibut", &[d("medium", 55.0), d("well_done", 60.0)]),
            f("shrimp", &[d("safe", 63.0)]),
            f("lobster", &[d("medium", 60.0)]),
        ],
    },
    Category {
        id: "game",
        foods: &[
            f("wild_boar", &[d("medium", 63.0), d("well_done", 68.0)]),
            f("venison", LAMB_PINK),
            f("rabbit", &[d("medium", 63.0), d("well_done", 71.0)]),
        ],
    },
    Category {
        id: "other",
        foods: &[
            f("egg_soft_boiled", &[d("soft", 64.0)]),
            f("egg_poached", &[d("perfect", 67.0)]),
            f("egg_hard_boiled", &[d("hard", 77.0)]),
        ],
    },
];

/// Read-only lookup over a food table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodReference {
    categories: &'static [Category],
}

impl Default for FoodReference {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FoodReference {
    /// The built-in table.
    pub fn builtin() -> Self {
        Self {
            categories: FOOD_DATABASE,
        }
    }

    /// Wrap a custom table.
    pub fn new(categories: &'static [Category]) -> Self {
        Self { categories }
    }

    /// All categories in display order (excluding the manual pseudo-category).
    pub fn categories(&self) -> &'static [Category] {
        self.categories
    }

    /// Look up a category.
    pub fn category(&self, category: &str) -> Option<&'static Category> {
        self.categories.iter().find(|c| c.id == category)
    }

    /// Look up a food within a category.
    pub fn food(&self, category: &str, food: &str) -> Option<&'static Food> {
        self.category(category)?.foods.iter().find(|f| f.id == food)
    }

    /// Foods available for a category.
    pub fn foods(&self, category: &str) -> &'static [Food] {
        self.category(category).map(|c| c.foods).unwrap_or(&[])
    }

    /// Doneness presets available for a food.
    pub fn doneness(&self, category: &str, food: &str) -> &'static [Doneness] {
        self.food(category, food).map(|f| f.doneness).unwrap_or(&[])
    }

    /// Target temperature for a full selection.
    pub fn temperature(&self, category: &str, food: &str, doneness: &str) -> Option<f64> {
        self.doneness(category, food)
            .iter()
            .find(|d| d.id == doneness)
            .map(|d| d.temperature)
    }

    /// Default food for a category.
    pub fn first_food(&self, category: &str) -> Option<&'static Food> {
        self.foods(category).first()
    }

    /// Default doneness for a food.
    pub fn first_doneness(&self, category: &str, food: &str) -> Option<&'static Doneness> {
        self.doneness(category, food).first()
    }
}

/// Extract the food id from a combined food-type identifier.
///
/// Strips everything up to and including the first `_`:
///
/// ```
/// use cooker_card::data::food::food_from_type;
///
/// assert_eq!(food_from_type("poultry_chicken_breast"), "chicken_breast");
/// assert_eq!(food_from_type("beef_steak"), "steak");
/// ```
pub fn food_from_type(food_type: &str) -> &str {
    match food_type.find('_') {
        Some(idx) => &food_type[idx + 1..],
        None => food_type,
    }
}

/// Build the combined food-type identifier sent to the backend.
pub fn food_type(category: &str, food: &str) -> String {
    format!("{}_{}", category, food)
}
