//! # Chemical Library Module
//!
//! ## Aim
//! Manages the user's personal chemical library: a flat-text file with one
//! chemical per line, written as the molar mass followed by one or more names
//! for the same chemical ("58.44 NaCl salt"). Supports adding single
//! chemicals, bulk imports from a file, nicknaming, deletion and display.
//!
//! Every mutation validates first and writes after, so a bad line in an import
//! file leaves the library untouched.

use crate::errors::BufError;
use crate::library_manager::with_library_manager;
use crate::user_input;
use log::{info, warn};
use prettytable::{Table, row};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub const INSTRUCTIONS: &str = "\
This subcommand allows you to access and modify your chemical library, i.e. your personal \
list of chemicals that you use to make buffers.

View your entire chemical library: 'buf chemical'
View information about a specific chemical: 'buf chemical <chemical_name>'

To add a chemical to your library, call 'buf chemical -a <molar_mass> <chemical_names>...'. \
The repeating final argument allows you to specify multiple names for the same chemical. \
For example, calling 'buf chemical -a 58.44 NaCl salt' adds both 'NaCl' and 'salt' to your \
chemical library, both with the same molar mass.

To add multiple chemicals at once, place them in a file (one per line, the molar mass first) \
and call 'buf chemical -a <file_name>'.

To attach additional names to an existing entry, use \
'buf chemical -n <existing_name> <new_names>...'.

To delete a chemical, use 'buf chemical -d <chemical_name>'. Pass --complete to remove the \
entry under all of its names, and --confirm to skip the confirmation prompt.";

/// One chemical: its molar mass in g/mol and every name it is known by.
#[derive(Debug, Clone)]
pub struct Chemical {
    pub molar_mass: f64,
    pub names: Vec<String>,
}

impl Chemical {
    /// Validates raw user input into a Chemical: every name must be new to the
    /// library, the molar mass must parse and be positive.
    pub fn make_safe(
        molar_mass: &str,
        names: &[String],
        library: &ChemicalLibrary,
    ) -> Result<Chemical, BufError> {
        for name in names {
            if library.contains(name) {
                return Err(BufError::ChemicalAlreadyExists(name.clone()));
            }
        }

        let molar_mass: f64 = molar_mass
            .parse()
            .map_err(|_| BufError::NonNumberMolarMass(molar_mass.to_string()))?;

        if molar_mass <= 0.0 {
            return Err(BufError::NonPositiveMolarMass(molar_mass));
        }

        Ok(Chemical {
            molar_mass,
            names: names.to_vec(),
        })
    }
}

// The Display form is the library file line format.
impl fmt::Display for Chemical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.molar_mass, self.names.join(" "))
    }
}

impl PartialEq for Chemical {
    fn eq(&self, other: &Self) -> bool {
        let own: HashSet<&str> = self.names.iter().map(String::as_str).collect();
        let theirs: HashSet<&str> = other.names.iter().map(String::as_str).collect();
        self.molar_mass == other.molar_mass && own == theirs
    }
}

/// The chemical library: an arena of chemicals plus a map from every known
/// name (nicknames included) to the entry that owns it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChemicalLibrary {
    chemicals: Vec<Chemical>,
    name_to_chemical: HashMap<String, usize>,
}

impl ChemicalLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a library file. Each non-empty line must hold a molar mass
    /// followed by at least one name; a repeated name anywhere in the file is
    /// rejected.
    pub fn load_from(path: &str) -> Result<Self, BufError> {
        if !Path::new(path).exists() {
            return Err(BufError::FileNotFound(path.to_string()));
        }
        let content = fs::read_to_string(path)?;

        let mut library = ChemicalLibrary::new();
        for (index, line) in content.lines().enumerate() {
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            if words.len() < 2 {
                return Err(BufError::ChemicalLineTooShort(index + 1));
            }

            let names: Vec<String> = words[1..].iter().map(|s| s.to_string()).collect();
            let chemical = Chemical::make_safe(words[0], &names, &library)?;
            library.insert(chemical);
        }

        info!(
            "Loaded {} chemicals from '{}'",
            library.chemicals.len(),
            path
        );
        Ok(library)
    }

    /// Writes the library back out, one line per chemical.
    pub fn save_to(&self, path: &str) -> Result<(), BufError> {
        let mut content = String::new();
        for chemical in &self.chemicals {
            content.push_str(&chemical.to_string());
            content.push('\n');
        }
        fs::write(path, content)?;

        info!("Saved {} chemicals to '{}'", self.chemicals.len(), path);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_chemical.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Chemical> {
        self.name_to_chemical
            .get(name)
            .map(|&index| &self.chemicals[index])
    }

    pub fn chemicals(&self) -> &[Chemical] {
        &self.chemicals
    }

    pub fn is_empty(&self) -> bool {
        self.chemicals.is_empty()
    }

    /// Every known name, sorted, for stable display.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.name_to_chemical.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Adds an already-validated chemical to the arena.
    pub fn insert(&mut self, chemical: Chemical) {
        let index = self.chemicals.len();
        for name in &chemical.names {
            self.name_to_chemical.insert(name.clone(), index);
        }
        self.chemicals.push(chemical);
    }

    /// Attaches additional names to the entry that owns `existing_name`.
    pub fn nickname(&mut self, existing_name: &str, new_names: &[String]) -> Result<(), BufError> {
        let index = *self
            .name_to_chemical
            .get(existing_name)
            .ok_or_else(|| BufError::ChemicalNotFound(existing_name.to_string()))?;

        for name in new_names {
            if self.contains(name) {
                return Err(BufError::ChemicalAlreadyExists(name.clone()));
            }
        }

        let mut seen = HashSet::new();
        for name in new_names {
            if !seen.insert(name.as_str()) {
                return Err(BufError::DuplicateFileEntry(name.clone()));
            }
        }

        for name in new_names {
            self.chemicals[index].names.push(name.clone());
            self.name_to_chemical.insert(name.clone(), index);
        }
        Ok(())
    }

    /// Removes `name` from the library. With `complete` the whole entry goes,
    /// under all of its names; otherwise only this one name is detached (the
    /// entry disappears anyway if that was its last name). Returns the names
    /// that were removed.
    pub fn delete(&mut self, name: &str, complete: bool) -> Result<Vec<String>, BufError> {
        let index = *self
            .name_to_chemical
            .get(name)
            .ok_or_else(|| BufError::ChemicalNotFound(name.to_string()))?;

        if !complete && self.chemicals[index].names.len() > 1 {
            self.chemicals[index].names.retain(|n| n != name);
            self.name_to_chemical.remove(name);
            return Ok(vec![name.to_string()]);
        }

        let removed = self.chemicals.remove(index).names;
        for removed_name in &removed {
            self.name_to_chemical.remove(removed_name);
        }
        // Entries after the removed one shifted down by one.
        for entry_index in self.name_to_chemical.values_mut() {
            if *entry_index > index {
                *entry_index -= 1;
            }
        }
        Ok(removed)
    }
}

fn library_path() -> Result<String, BufError> {
    with_library_manager(|manager| {
        manager.ensure_library_files()?;
        Ok(manager.chemical_library_path().to_string())
    })
}

/// Loads the configured chemical library, creating an empty file on first use.
pub fn load_chemicals() -> Result<ChemicalLibrary, BufError> {
    ChemicalLibrary::load_from(&library_path()?)
}

pub fn save_chemicals(library: &ChemicalLibrary) -> Result<(), BufError> {
    library.save_to(&library_path()?)
}

/// Validates and appends one chemical to the library file.
pub fn add_single_chemical(molar_mass: &str, names: &[String]) -> Result<(), BufError> {
    let library = load_chemicals()?;
    let chemical = Chemical::make_safe(molar_mass, names, &library)?;

    let mut file = OpenOptions::new().append(true).open(library_path()?)?;
    writeln!(file, "{}", chemical)?;
    Ok(())
}

/// Bulk import: validates every line of `filename` against the existing
/// library and the file itself, then appends them all. Nothing is written if
/// any line fails.
pub fn add_chemicals_from_file(filename: &str) -> Result<(), BufError> {
    if !Path::new(filename).exists() {
        return Err(BufError::FileNotFound(filename.to_string()));
    }
    let content = fs::read_to_string(filename)?;

    let mut library = load_chemicals()?;
    let mut new_chemicals = Vec::new();
    let mut new_names = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        if words.len() < 2 {
            return Err(BufError::ChemicalLineTooShort(index + 1));
        }

        let names: Vec<String> = words[1..].iter().map(|s| s.to_string()).collect();
        let chemical = Chemical::make_safe(words[0], &names, &library)?;

        new_names.extend(names);
        library.insert(chemical.clone());
        new_chemicals.push(chemical);
    }

    let mut file = OpenOptions::new().append(true).open(library_path()?)?;
    for chemical in &new_chemicals {
        writeln!(file, "{}", chemical)?;
    }

    println!(
        "Added the following chemicals to your library: {}",
        new_names.join(" ")
    );
    Ok(())
}

/// Prints one chemical: its name, any other names it goes by, and its molar
/// mass.
pub fn display_chemical_information(name: &str) -> Result<(), BufError> {
    let library = load_chemicals()?;
    let chemical = library
        .get(name)
        .ok_or_else(|| BufError::ChemicalNotFound(name.to_string()))?;

    println!("Chemical name: {}", name);

    let other_names: Vec<&str> = chemical
        .names
        .iter()
        .filter(|n| n.as_str() != name)
        .map(String::as_str)
        .collect();
    if !other_names.is_empty() {
        println!("Other names: {}", other_names.join(", "));
    }

    println!("Molar mass: {}", chemical.molar_mass);
    Ok(())
}

/// Prints the whole library as a table, one row per name.
pub fn display_chemical_library() -> Result<(), BufError> {
    let library = load_chemicals()?;
    if library.is_empty() {
        warn!("Chemical library is empty");
        println!("Your chemical library is empty.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["Chemical Name", "Molar Mass"]);
    for name in library.sorted_names() {
        if let Some(chemical) = library.get(name) {
            table.add_row(row![name, chemical.molar_mass]);
        }
    }
    table.printstd();
    Ok(())
}

pub fn nickname_chemical(existing_name: &str, new_names: &[String]) -> Result<(), BufError> {
    let mut library = load_chemicals()?;
    library.nickname(existing_name, new_names)?;
    save_chemicals(&library)
}

/// Deletes a chemical after an interactive confirmation, unless the caller
/// passed pre-confirmation.
pub fn delete_chemical(name: &str, complete: bool, pre_confirmed: bool) -> Result<(), BufError> {
    let mut library = load_chemicals()?;
    if !library.contains(name) {
        return Err(BufError::ChemicalNotFound(name.to_string()));
    }

    if !pre_confirmed {
        if complete {
            let all_names = library.get(name).map(|c| c.names.join(" ")).unwrap_or_default();
            println!(
                "You are about to delete the following chemicals from your library: {}",
                all_names
            );
        } else {
            println!("You are about to delete '{}' from your chemical library.", name);
        }
        if !user_input::confirm() {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = library.delete(name, complete)?;
    save_chemicals(&library)?;
    println!("Deleted: {}", removed.join(" "));
    Ok(())
}
