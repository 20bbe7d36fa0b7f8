//! Built-in reference data for the tracked nutrients
//!
//! RDA values are adult daily values. Units match the catalog units of the
//! corresponding `meals` columns.

use crate::model::NewNutrient;

pub struct ReferenceNutrient {
    pub name: &'static str,
    pub unit: &'static str,
    pub aliases: &'static str,
    pub description: &'static str,
    pub sources: &'static str,
    pub rda: f64,
}

impl ReferenceNutrient {
    pub fn to_new(&self) -> NewNutrient {
        NewNutrient {
            name: self.name.to_string(),
            unit: Some(self.unit.to_string()),
            aliases: Some(self.aliases.to_string()),
            description: Some(self.description.to_string()),
            sources: Some(self.sources.to_string()),
            rda: Some(self.rda),
        }
    }
}

pub const REFERENCE_NUTRIENTS: &[ReferenceNutrient] = &[
    ReferenceNutrient {
        name: "calories",
        unit: "kcal",
        aliases: "energy,kcal",
        description: "Dietary energy",
        sources: "Whole grains, legumes, nuts, seeds",
        rda: 2000.0,
    },
    ReferenceNutrient {
        name: "carbohydrates",
        unit: "g",
        aliases: "carbs,carbohydrate",
        description: "Total carbohydrates",
        sources: "Oats, rice, potatoes, fruit, legumes",
        rda: 275.0,
    },
    ReferenceNutrient {
        name: "protein",
        unit: "g",
        aliases: "proteins",
        description: "Protein",
        sources: "Tofu, tempeh, lentils, seitan, chickpeas",
        rda: 50.0,
    },
    ReferenceNutrient {
        name: "fats",
        unit: "g",
        aliases: "fat,total fat,lipids",
        description: "Total fat",
        sources: "Avocado, nuts, seeds, olive oil",
        rda: 78.0,
    },
    ReferenceNutrient {
        name: "fiber",
        unit: "g",
        aliases: "fibre,dietary fiber",
        description: "Dietary fiber",
        sources: "Beans, lentils, whole grains, vegetables",
        rda: 28.0,
    },
    ReferenceNutrient {
        name: "iron",
        unit: "mg",
        aliases: "fe",
        description: "Non-heme iron; absorption improves with vitamin C",
        sources: "Lentils, spinach, tofu, pumpkin seeds, fortified cereals",
        rda: 18.0,
    },
    ReferenceNutrient {
        name: "calcium",
        unit: "mg",
        aliases: "ca",
        description: "Calcium",
        sources: "Calcium-set tofu, fortified plant milk, kale, tahini",
        rda: 1000.0,
    },
    ReferenceNutrient {
        name: "zinc",
        unit: "mg",
        aliases: "zn",
        description: "Zinc",
        sources: "Pumpkin seeds, chickpeas, cashews, oats",
        rda: 11.0,
    },
    ReferenceNutrient {
        name: "magnesium",
        unit: "mg",
        aliases: "mg",
        description: "Magnesium",
        sources: "Almonds, spinach, black beans, dark chocolate",
        rda: 420.0,
    },
    ReferenceNutrient {
        name: "b1",
        unit: "mg",
        aliases: "thiamine,thiamin,vitamin b1",
        description: "Vitamin B1",
        sources: "Sunflower seeds, black beans, whole grains",
        rda: 1.2,
    },
    ReferenceNutrient {
        name: "b2",
        unit: "mg",
        aliases: "riboflavin,vitamin b2",
        description: "Vitamin B2",
        sources: "Almonds, mushrooms, fortified nutritional yeast",
        rda: 1.3,
    },
    ReferenceNutrient {
        name: "b3",
        unit: "mg",
        aliases: "niacin,vitamin b3",
        description: "Vitamin B3",
        sources: "Peanuts, mushrooms, brown rice",
        rda: 16.0,
    },
    ReferenceNutrient {
        name: "b5",
        unit: "mg",
        aliases: "pantothenic acid,vitamin b5",
        description: "Vitamin B5",
        sources: "Avocado, shiitake, sweet potato",
        rda: 5.0,
    },
    ReferenceNutrient {
        name: "b6",
        unit: "mg",
        aliases: "pyridoxine,vitamin b6",
        description: "Vitamin B6",
        sources: "Chickpeas, bananas, potatoes",
        rda: 1.7,
    },
    ReferenceNutrient {
        name: "b9",
        unit: "mcg",
        aliases: "folate,folic acid,vitamin b9",
        description: "Vitamin B9",
        sources: "Lentils, leafy greens, asparagus",
        rda: 400.0,
    },
    ReferenceNutrient {
        name: "b12",
        unit: "mcg",
        aliases: "cobalamin,vitamin b12",
        description: "Vitamin B12; vegans need fortified foods or supplements",
        sources: "Fortified plant milk, nutritional yeast, supplements",
        rda: 2.4,
    },
    ReferenceNutrient {
        name: "omega3",
        unit: "g",
        aliases: "omega-3,omega 3,ala,dha,epa",
        description: "Omega-3 fatty acids",
        sources: "Flaxseed, chia seeds, walnuts, algae oil",
        rda: 1.6,
    },
    ReferenceNutrient {
        name: "vitamin_a",
        unit: "mcg",
        aliases: "vitamin a,retinol,beta-carotene",
        description: "Vitamin A (RAE)",
        sources: "Sweet potato, carrots, kale",
        rda: 900.0,
    },
    ReferenceNutrient {
        name: "vitamin_c",
        unit: "mg",
        aliases: "vitamin c,ascorbic acid",
        description: "Vitamin C",
        sources: "Bell peppers, citrus, broccoli, strawberries",
        rda: 90.0,
    },
    ReferenceNutrient {
        name: "vitamin_e",
        unit: "mg",
        aliases: "vitamin e,tocopherol",
        description: "Vitamin E",
        sources: "Sunflower seeds, almonds, spinach",
        rda: 15.0,
    },
    ReferenceNutrient {
        name: "vitamin_k",
        unit: "mcg",
        aliases: "vitamin k,phylloquinone",
        description: "Vitamin K",
        sources: "Kale, broccoli, natto, spinach",
        rda: 120.0,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NUTRIENT_COLUMNS;
    use crate::store::catalog;

    #[test]
    fn test_reference_covers_every_nutrient_column() {
        let names: Vec<&str> = REFERENCE_NUTRIENTS.iter().map(|n| n.name).collect();
        assert_eq!(names, NUTRIENT_COLUMNS);
    }

    #[test]
    fn test_reference_units_match_catalog() {
        for nutrient in REFERENCE_NUTRIENTS {
            assert_eq!(catalog::unit_of(nutrient.name), Some(nutrient.unit));
        }
    }
}
