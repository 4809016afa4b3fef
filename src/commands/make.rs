//! # Buffer Making Module
//!
//! ## Aim
//! Turns a recipe and a final volume into concrete bench instructions: for
//! each ingredient, the mass or volume to add, auto-scaled for readability.
//! A molar concentration becomes grams via molar mass × molarity × volume, a
//! percentage becomes that fraction of the final volume, and a constant mass
//! or volume passes through unchanged.

use crate::commands::chemical::{self, ChemicalLibrary};
use crate::commands::recipe::{self, Recipe, make_safe_recipe};
use crate::errors::BufError;
use crate::unit::{
    UnitFamily, classify_unit, concentration_unit_to_molar, scale_and_round_quantity,
    split_unit_quantity, volume_unit_to_litres,
};
use prettytable::{Table, row};

pub const INSTRUCTIONS: &str = "\
Calculate the amount of each ingredient required to make a buffer/solution.

Make an already-defined recipe: 'buf make <volume> <recipe_name>'
Define a recipe as you make it: 'buf make <volume> (<concentration> <chemical_name>)...'

For example, 'buf make 0.5L saline' prints the mass of each chemical in the 'saline' \
recipe needed to prepare 500mL of it.";

/// Parses a buffer volume like "0.5L" into litres. The magnitude must be a
/// positive number and the symbol a unit of volume.
pub fn buffer_volume_litres(text: &str) -> Result<f64, BufError> {
    let (magnitude, symbol) = split_unit_quantity(text);

    let magnitude: f64 = magnitude
        .parse()
        .map_err(|_| BufError::NonNumberQuantity(magnitude.to_string()))?;
    if magnitude <= 0.0 {
        return Err(BufError::NonPositiveQuantity(magnitude.to_string()));
    }

    let to_litres =
        volume_unit_to_litres(symbol).map_err(|_| BufError::InvalidVolumeUnit(symbol.to_string()))?;
    Ok(magnitude * to_litres)
}

/// Computes the display amount of one ingredient for a buffer of
/// `volume_litres`.
pub fn amount_to_add(
    volume_litres: f64,
    concentration: &str,
    chemical_name: &str,
    chemicals: &ChemicalLibrary,
) -> Result<String, BufError> {
    let (magnitude, symbol) = split_unit_quantity(concentration);
    let magnitude: f64 = magnitude
        .parse()
        .map_err(|_| BufError::NonNumberQuantity(magnitude.to_string()))?;

    match classify_unit(symbol)? {
        // Constant amounts are added as given, regardless of the buffer volume.
        UnitFamily::Volume | UnitFamily::Mass => Ok(scale_and_round_quantity(magnitude, symbol)?),
        UnitFamily::Concentration => {
            let chemical = chemicals
                .get(chemical_name)
                .ok_or_else(|| BufError::MolarMassRequired(chemical_name.to_string()))?;
            let grams = magnitude
                * concentration_unit_to_molar(symbol)?
                * chemical.molar_mass
                * volume_litres;
            Ok(scale_and_round_quantity(grams, "g")?)
        }
        UnitFamily::Percent => {
            Ok(scale_and_round_quantity(magnitude / 100.0 * volume_litres, "L")?)
        }
    }
}

/// One line of bench instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub chemical_name: String,
    pub concentration: String,
    pub amount_to_add: String,
}

/// The full instruction list for one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferInstructions {
    pub steps: Vec<Step>,
}

impl BufferInstructions {
    pub fn new(
        volume_litres: f64,
        recipe: &Recipe,
        chemicals: &ChemicalLibrary,
    ) -> Result<Self, BufError> {
        let mut steps = Vec::new();
        for (concentration, chemical_name) in
            recipe.concentrations.iter().zip(&recipe.chemical_names)
        {
            steps.push(Step {
                chemical_name: chemical_name.clone(),
                concentration: concentration.clone(),
                amount_to_add: amount_to_add(volume_litres, concentration, chemical_name, chemicals)?,
            });
        }
        Ok(BufferInstructions { steps })
    }

    pub fn print(&self) {
        let mut table = Table::new();
        table.add_row(row!["Chemical Name", "Concentration", "Amount to Add"]);
        for step in &self.steps {
            table.add_row(row![
                step.chemical_name,
                step.concentration,
                step.amount_to_add
            ]);
        }
        table.printstd();
    }
}

fn get_recipe(recipe_name: &str) -> Result<Recipe, BufError> {
    let library = recipe::load_recipes()?;
    library
        .get(recipe_name)
        .cloned()
        .ok_or_else(|| BufError::RecipeNotFound(recipe_name.to_string()))
}

/// Entry point for 'buf make': resolves the recipe (stored or inline), scales
/// it to the requested volume and prints the instruction table.
pub fn make_buffer(
    volume: &str,
    recipe_name: Option<&str>,
    concentrations: &[String],
    chemical_names: &[String],
) -> Result<(), BufError> {
    let recipe = match recipe_name {
        Some(name) => get_recipe(name)?,
        None => {
            let chemicals = chemical::load_chemicals()?;
            // An inline recipe is validated but never stored, so it carries no
            // name and is checked against an empty recipe library.
            make_safe_recipe(
                "",
                concentrations,
                chemical_names,
                &chemicals,
                &recipe::RecipeLibrary::new(),
            )?
        }
    };

    let volume_litres = buffer_volume_litres(volume)?;
    let chemicals = chemical::load_chemicals()?;
    let instructions = BufferInstructions::new(volume_litres, &recipe, &chemicals)?;
    instructions.print();
    Ok(())
}
