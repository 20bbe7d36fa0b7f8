//! SQLite schema definition
//!
//! Column order and nullability are part of the on-disk contract. Queries
//! produced by the language model reference these columns by name, so any
//! migration must keep the names stable.

pub const SCHEMA: &str = r#"
-- ============================================
-- MEAL LOG
-- ============================================

-- One row per logged meal. Every nutrient column is nullable: a meal does
-- not need complete nutritional data. No foreign keys, no triggers.
CREATE TABLE IF NOT EXISTS meals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT,                             -- ISO 'YYYY-MM-DD'
    time TEXT,                             -- 'HH:MM:SS'
    meal_type TEXT,                        -- 'Breakfast', 'Lunch', 'Dinner', 'Snack', 'Drink'
    meal_name TEXT,
    meal_source TEXT,                      -- 'Homemade', 'Restaurant', ...
    food_description TEXT,

    -- Macronutrients
    calories REAL,
    carbohydrates REAL,
    protein REAL,
    fats REAL,
    fiber REAL,

    -- Minerals
    iron REAL,
    calcium REAL,
    zinc REAL,
    magnesium REAL,

    -- B vitamins
    b1 REAL,
    b2 REAL,
    b3 REAL,
    b5 REAL,
    b6 REAL,
    b9 REAL,
    b12 REAL,

    -- Other nutrients
    omega3 REAL,
    vitamin_a REAL,
    vitamin_c REAL,
    vitamin_e REAL,
    vitamin_k REAL,

    notes TEXT
);

-- ============================================
-- NUTRIENT METADATA
-- ============================================

-- Reference data per nutrient. Names line up with the nutrient columns of
-- `meals` by convention only.
CREATE TABLE IF NOT EXISTS nutrient_metadata (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE,
    unit TEXT,                             -- 'mg', 'g', 'mcg', 'kcal'
    aliases TEXT,                          -- comma-separated
    description TEXT,
    sources TEXT,                          -- vegan food sources
    rda REAL                               -- recommended daily allowance
);

-- ============================================
-- INDEXES
-- ============================================

CREATE INDEX IF NOT EXISTS idx_meals_date ON meals(date, time);
CREATE INDEX IF NOT EXISTS idx_meals_type ON meals(meal_type);
"#;
