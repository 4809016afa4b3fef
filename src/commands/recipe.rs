//! # Recipe Library Module
//!
//! ## Aim
//! Manages the user's recipe library. A recipe is a named list of chemical
//! concentrations, stored one per line as the recipe name followed by
//! concentration/chemical pairs ("saline 300mM NaCl 10% glycerol").
//!
//! A concentration can be a molarity ("300mM", requires the chemical's molar
//! mass to be in the chemical library), a percentage of the final volume
//! ("10%"), or a constant mass or volume added regardless of the final volume
//! ("10g", "50mL").

use crate::commands::chemical::{self, ChemicalLibrary};
use crate::errors::BufError;
use crate::library_manager::with_library_manager;
use crate::unit::{UnitFamily, classify_unit, split_unit_quantity};
use crate::user_input;
use log::{info, warn};
use prettytable::{Table, row};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub const INSTRUCTIONS: &str = "\
This subcommand allows you to access and modify your recipe library. A recipe is a list of \
chemical names preceded by their concentrations, for example '300mM NaCl 4M Arginine'.

View your entire recipe library: 'buf recipe'
View information about a specific recipe: 'buf recipe <recipe_name>'

To add a recipe to your library, use 'buf recipe -a <recipe_name> (<concentration> \
<chemical_name>)...'. For example, to add the recipe specified above, use \
'buf recipe -a my_recipe 300mM NaCl 4M Arginine'.

Chemical concentrations can be specified in a number of ways. In addition to specifying \
molarity (e.g. '300mM NaCl'), you can specify a percentage of solution, for example \
'10% glycerol'. Furthermore, you can specify a constant mass or volume, to be added to the \
buffer regardless of its volume. For example, specifying '10g NaCl' will result in 10g of \
NaCl being added to the buffer in all cases.

To add multiple recipes at once, place them in a file (one per line) and call \
'buf recipe -a <file_name>'.

To delete a recipe, use 'buf recipe -d <recipe_name>'. Pass --confirm to skip the \
confirmation prompt.";

/// One recipe: parallel lists of concentration strings and the chemicals they
/// apply to.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub name: String,
    pub concentrations: Vec<String>,
    pub chemical_names: Vec<String>,
}

impl Recipe {
    /// The recipe body without its name: "300mM NaCl 4M Arginine".
    pub fn contents(&self) -> String {
        self.concentrations
            .iter()
            .zip(&self.chemical_names)
            .map(|(concentration, chemical)| format!("{} {}", concentration, chemical))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// The Display form is the library file line format.
impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.contents())
    }
}

/// Validates raw input into a Recipe. The name must be new to the recipe
/// library; every concentration must split into a positive number and a
/// recognized unit; molar concentrations require the chemical to exist in the
/// chemical library, since making the buffer will need its molar mass.
pub fn make_safe_recipe(
    name: &str,
    concentrations: &[String],
    chemical_names: &[String],
    chemicals: &ChemicalLibrary,
    recipes: &RecipeLibrary,
) -> Result<Recipe, BufError> {
    if recipes.contains(name) {
        return Err(BufError::RecipeAlreadyExists(name.to_string()));
    }

    for (concentration, chemical_name) in concentrations.iter().zip(chemical_names) {
        let (magnitude, symbol) = split_unit_quantity(concentration);

        let family = classify_unit(symbol)
            .map_err(|_| BufError::InvalidConcentrationUnit(symbol.to_string()))?;

        if family == UnitFamily::Concentration && !chemicals.contains(chemical_name) {
            return Err(BufError::MolarMassRequired(chemical_name.clone()));
        }

        let magnitude: f64 = magnitude
            .parse()
            .map_err(|_| BufError::NonNumberQuantity(magnitude.to_string()))?;
        if magnitude <= 0.0 {
            return Err(BufError::NonPositiveQuantity(magnitude.to_string()));
        }
    }

    Ok(Recipe {
        name: name.to_string(),
        concentrations: concentrations.to_vec(),
        chemical_names: chemical_names.to_vec(),
    })
}

/// The recipe library: recipe name → recipe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeLibrary {
    recipes: HashMap<String, Recipe>,
}

impl RecipeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a recipe library file, validating every recipe against
    /// `chemicals`. Each non-empty line is a recipe name followed by at least
    /// one concentration/chemical pair.
    pub fn load_from(path: &str, chemicals: &ChemicalLibrary) -> Result<Self, BufError> {
        if !Path::new(path).exists() {
            return Err(BufError::FileNotFound(path.to_string()));
        }
        let content = fs::read_to_string(path)?;

        let mut library = RecipeLibrary::new();
        for (index, line) in content.lines().enumerate() {
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            let recipe = parse_recipe_line(&words, index + 1, chemicals, &library)?;
            library.insert(recipe);
        }

        info!("Loaded {} recipes from '{}'", library.recipes.len(), path);
        Ok(library)
    }

    /// Writes the library back out, one line per recipe.
    pub fn save_to(&self, path: &str) -> Result<(), BufError> {
        let mut content = String::new();
        for name in self.sorted_names() {
            content.push_str(&self.recipes[name].to_string());
            content.push('\n');
        }
        fs::write(path, content)?;

        info!("Saved {} recipes to '{}'", self.recipes.len(), path);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.recipes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.recipes.get(name)
    }

    pub fn insert(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.name.clone(), recipe);
    }

    pub fn remove(&mut self, name: &str) -> Option<Recipe> {
        self.recipes.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.recipes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn parse_recipe_line(
    words: &[&str],
    line_number: usize,
    chemicals: &ChemicalLibrary,
    library: &RecipeLibrary,
) -> Result<Recipe, BufError> {
    if words.len() < 3 {
        return Err(BufError::RecipeLineTooShort(line_number));
    }
    if (words.len() - 1) % 2 != 0 {
        return Err(BufError::RecipeLineUnpaired(line_number));
    }

    let name = words[0];
    let concentrations: Vec<String> = words[1..].iter().step_by(2).map(|s| s.to_string()).collect();
    let chemical_names: Vec<String> = words[2..].iter().step_by(2).map(|s| s.to_string()).collect();

    make_safe_recipe(name, &concentrations, &chemical_names, chemicals, library)
}

fn library_path() -> Result<String, BufError> {
    with_library_manager(|manager| {
        manager.ensure_library_files()?;
        Ok(manager.recipe_library_path().to_string())
    })
}

/// Loads the configured recipe library, creating an empty file on first use.
pub fn load_recipes() -> Result<RecipeLibrary, BufError> {
    let chemicals = chemical::load_chemicals()?;
    RecipeLibrary::load_from(&library_path()?, &chemicals)
}

pub fn save_recipes(library: &RecipeLibrary) -> Result<(), BufError> {
    library.save_to(&library_path()?)
}

/// Validates and appends one recipe to the library file.
pub fn add_single_recipe(
    name: &str,
    concentrations: &[String],
    chemical_names: &[String],
) -> Result<(), BufError> {
    let chemicals = chemical::load_chemicals()?;
    let recipes = load_recipes()?;
    let recipe = make_safe_recipe(name, concentrations, chemical_names, &chemicals, &recipes)?;

    let mut file = OpenOptions::new().append(true).open(library_path()?)?;
    writeln!(file, "{}", recipe)?;
    Ok(())
}

/// Bulk import: validates every line of `filename`, then appends them all.
/// Nothing is written if any line fails.
pub fn add_recipes_from_file(filename: &str) -> Result<(), BufError> {
    if !Path::new(filename).exists() {
        return Err(BufError::FileNotFound(filename.to_string()));
    }
    let content = fs::read_to_string(filename)?;

    let chemicals = chemical::load_chemicals()?;
    let mut library = load_recipes()?;
    let mut new_recipes = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        let recipe = parse_recipe_line(&words, index + 1, &chemicals, &library)?;
        library.insert(recipe.clone());
        new_recipes.push(recipe);
    }

    let mut file = OpenOptions::new().append(true).open(library_path()?)?;
    for recipe in &new_recipes {
        writeln!(file, "{}", recipe)?;
    }

    println!(
        "Added the following recipes to your library: {}",
        new_recipes
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    );
    Ok(())
}

/// Prints one recipe: its name and contents.
pub fn display_recipe_information(name: &str) -> Result<(), BufError> {
    let library = load_recipes()?;
    let recipe = library
        .get(name)
        .ok_or_else(|| BufError::RecipeNotFound(name.to_string()))?;

    println!("Recipe name: {}", recipe.name);
    println!("Contents: {}", recipe.contents());
    Ok(())
}

/// Prints the whole recipe library as a table.
pub fn display_recipe_library() -> Result<(), BufError> {
    let library = load_recipes()?;
    if library.is_empty() {
        warn!("Recipe library is empty");
        println!("Your recipe library is empty.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["Recipe Name", "Contents"]);
    for name in library.sorted_names() {
        if let Some(recipe) = library.get(name) {
            table.add_row(row![name, recipe.contents()]);
        }
    }
    table.printstd();
    Ok(())
}

/// Deletes a recipe after an interactive confirmation, unless the caller
/// passed pre-confirmation.
pub fn delete_recipe(name: &str, pre_confirmed: bool) -> Result<(), BufError> {
    let mut library = load_recipes()?;
    if !library.contains(name) {
        return Err(BufError::RecipeNotFound(name.to_string()));
    }

    if !pre_confirmed {
        println!("You are about to delete '{}' from your recipe library.", name);
        if !user_input::confirm() {
            println!("Aborted.");
            return Ok(());
        }
    }

    library.remove(name);
    save_recipes(&library)?;
    println!("Deleted recipe '{}'.", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::chemical::Chemical;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn chemical_library() -> ChemicalLibrary {
        let mut library = ChemicalLibrary::new();
        for (molar_mass, names) in [(58.44, vec!["NaCl", "salt"]), (74.55, vec!["KCl"])] {
            library.insert(Chemical {
                molar_mass,
                names: names.into_iter().map(|s| s.to_string()).collect(),
            });
        }
        library
    }

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_make_safe_recipe_accepts_all_concentration_kinds() {
        let chemicals = chemical_library();
        let recipes = RecipeLibrary::new();

        let recipe = make_safe_recipe(
            "my_recipe",
            &strings(&["300mM", "10%", "4g", "50µL"]),
            &strings(&["NaCl", "glycerol", "KCl", "Tween"]),
            &chemicals,
            &recipes,
        )
        .unwrap();

        assert_eq!(recipe.contents(), "300mM NaCl 10% glycerol 4g KCl 50µL Tween");
        assert_eq!(recipe.to_string(), format!("my_recipe {}", recipe.contents()));
    }

    #[test]
    fn test_make_safe_recipe_rejects_bad_concentrations() {
        let chemicals = chemical_library();
        let recipes = RecipeLibrary::new();

        let bad_unit = make_safe_recipe(
            "r",
            &strings(&["300qqq"]),
            &strings(&["NaCl"]),
            &chemicals,
            &recipes,
        );
        assert!(matches!(
            bad_unit,
            Err(BufError::InvalidConcentrationUnit(_))
        ));

        let not_a_number = make_safe_recipe(
            "r",
            &strings(&["1.2.3M"]),
            &strings(&["NaCl"]),
            &chemicals,
            &recipes,
        );
        assert!(matches!(not_a_number, Err(BufError::NonNumberQuantity(_))));

        let non_positive = make_safe_recipe(
            "r",
            &strings(&["0M"]),
            &strings(&["NaCl"]),
            &chemicals,
            &recipes,
        );
        assert!(matches!(non_positive, Err(BufError::NonPositiveQuantity(_))));
    }

    #[test]
    fn test_molarity_requires_known_chemical() {
        let chemicals = chemical_library();
        let recipes = RecipeLibrary::new();

        let unknown = make_safe_recipe(
            "r",
            &strings(&["300mM"]),
            &strings(&["Arginine"]),
            &chemicals,
            &recipes,
        );
        assert!(matches!(
            unknown,
            Err(BufError::MolarMassRequired(name)) if name == "Arginine"
        ));

        // A constant mass does not need a library entry.
        let constant_mass = make_safe_recipe(
            "r",
            &strings(&["4g"]),
            &strings(&["Arginine"]),
            &chemicals,
            &recipes,
        );
        assert!(constant_mass.is_ok());
    }

    #[test]
    fn test_name_collision() {
        let chemicals = chemical_library();
        let mut recipes = RecipeLibrary::new();
        recipes.insert(Recipe {
            name: "saline".to_string(),
            concentrations: strings(&["300mM"]),
            chemical_names: strings(&["NaCl"]),
        });

        let collision = make_safe_recipe(
            "saline",
            &strings(&["4M"]),
            &strings(&["KCl"]),
            &chemicals,
            &recipes,
        );
        assert!(matches!(collision, Err(BufError::RecipeAlreadyExists(_))));
    }

    #[test]
    fn test_load_save_round_trip() {
        let chemicals = chemical_library();

        let mut source = NamedTempFile::new().unwrap();
        writeln!(source, "saline 300mM NaCl").unwrap();
        writeln!(source, "wash 10% glycerol 4g KCl").unwrap();

        let library =
            RecipeLibrary::load_from(source.path().to_str().unwrap(), &chemicals).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(library.get("saline").unwrap().contents(), "300mM NaCl");

        let target = NamedTempFile::new().unwrap();
        library.save_to(target.path().to_str().unwrap()).unwrap();

        let reloaded =
            RecipeLibrary::load_from(target.path().to_str().unwrap(), &chemicals).unwrap();
        assert_eq!(library, reloaded);
    }

    #[test]
    fn test_load_rejects_malformed_lines() {
        let chemicals = chemical_library();

        let mut too_short = NamedTempFile::new().unwrap();
        writeln!(too_short, "saline").unwrap();
        assert!(matches!(
            RecipeLibrary::load_from(too_short.path().to_str().unwrap(), &chemicals),
            Err(BufError::RecipeLineTooShort(1))
        ));

        let mut unpaired = NamedTempFile::new().unwrap();
        writeln!(unpaired, "saline 300mM NaCl 4M").unwrap();
        assert!(matches!(
            RecipeLibrary::load_from(unpaired.path().to_str().unwrap(), &chemicals),
            Err(BufError::RecipeLineUnpaired(1))
        ));
    }
}
