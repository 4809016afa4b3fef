//! User-facing error types for the command layer. Messages carry the follow-up
//! command a user needs, since the CLI prints them once and stops the operation.

use crate::unit::{UnitError, valid_units};
use thiserror::Error;

/// Everything that can go wrong while validating input or touching the chemical
/// and recipe libraries. None of these terminate the process; `main` prints the
/// message and exits with a failure status.
#[derive(Debug, Error)]
pub enum BufError {
    #[error(
        "Chemical not found: '{0}' does not exist in your chemical library. To add a chemical \
         to your library, use 'buf chemical -a <molar_mass> <chemical_names>...'. For more \
         information, see 'buf chemical --help'."
    )]
    ChemicalNotFound(String),

    #[error(
        "Chemical already exists: '{0}' already exists in your library. To delete a chemical \
         from your library, use 'buf chemical -d <chemical_name>'. To see the chemicals in \
         your library, use 'buf chemical'."
    )]
    ChemicalAlreadyExists(String),

    #[error("Invalid molar mass: '{0}' is not a number.")]
    NonNumberMolarMass(String),

    #[error("Invalid molar mass: '{0}' must be greater than 0.")]
    NonPositiveMolarMass(f64),

    #[error(
        "Recipe not found: '{0}' does not exist in your recipe library. To add a recipe to \
         your library, use 'buf recipe -a <recipe_name> (<concentration> <chemical_name>)...'. \
         For more information, see 'buf recipe --help'."
    )]
    RecipeNotFound(String),

    #[error(
        "Recipe already exists: '{0}' already exists in your library. To delete a recipe from \
         your library, use 'buf recipe -d <recipe_name>'. To see the recipes in your library, \
         use 'buf recipe'."
    )]
    RecipeAlreadyExists(String),

    #[error(
        "Chemical not found: molar mass of '{0}' not in chemical library. Before specifying a \
         chemical's concentration with molarity, first use 'buf chemical -a <molar_mass> \
         <chemical_names>...' to add the chemical to your library."
    )]
    MolarMassRequired(String),

    #[error("Invalid unit: '{0}' is not a valid unit. Valid units are: {units}", units = valid_units().join(" "))]
    InvalidConcentrationUnit(String),

    #[error("Invalid unit: '{0}' is not a unit of volume.")]
    InvalidVolumeUnit(String),

    #[error("Invalid quantity: '{0}' is not a valid number.")]
    NonNumberQuantity(String),

    #[error("Invalid quantity: '{0}' is not greater than 0.")]
    NonPositiveQuantity(String),

    #[error("Duplicate file entry: '{0}' already used earlier in file.")]
    DuplicateFileEntry(String),

    #[error("Invalid line length: line {0} must have at least one name after its molar mass.")]
    ChemicalLineTooShort(usize),

    #[error(
        "Invalid line length: line {0} must contain a recipe name and at least one \
         concentration-chemical name pair."
    )]
    RecipeLineTooShort(usize),

    #[error(
        "Invalid line length: line {0} contains an inequal number of concentrations and \
         chemical names."
    )]
    RecipeLineUnpaired(usize),

    #[error("File not found: '{0}' could not be located.")]
    FileNotFound(String),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
