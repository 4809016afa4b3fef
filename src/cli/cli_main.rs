//! Command-line interface: one subcommand per library ('chemical', 'recipe')
//! plus 'make'. Each subcommand mirrors the action flags of the original
//! flat grammar: '-a' adds (from arguments or from a file), '-n' nicknames,
//! '-d' deletes, and no flag displays.

use crate::commands::{chemical, make, recipe};
use crate::errors::BufError;
use clap::{Args, Parser, Subcommand};

const GENERAL_HELP: &str = "\
Welcome to buf! Here's a brief overview of the program:

buf chemical:
    Modify and display your chemical library (chemical names and molar masses).

buf recipe:
    Define and edit buffer/solution recipes.

buf make:
    Calculate the amount of each ingredient required to make a buffer/solution.

For details about a specific subcommand, use 'buf <subcommand_name> --help'.";

#[derive(Parser, Debug)]
#[command(
    name = "buf",
    version,
    about = "For easily making chemical buffers and solutions",
    long_about = GENERAL_HELP
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Access and modify your chemical library
    #[command(long_about = chemical::INSTRUCTIONS)]
    Chemical(ChemicalArgs),
    /// Access and modify your recipe library
    #[command(long_about = recipe::INSTRUCTIONS)]
    Recipe(RecipeArgs),
    /// Calculate the ingredient amounts for a buffer
    #[command(long_about = make::INSTRUCTIONS)]
    Make(MakeArgs),
}

#[derive(Args, Debug)]
pub struct ChemicalArgs {
    /// Add a chemical ('-a <molar_mass> <chemical_names>...') or import a file ('-a <file_name>')
    #[arg(short = 'a', long = "add")]
    pub add: bool,

    /// Attach additional names to an existing chemical ('-n <existing_name> <new_names>...')
    #[arg(short = 'n', long = "nickname")]
    pub nickname: bool,

    /// Delete a chemical ('-d <chemical_name>')
    #[arg(short = 'd', long = "delete")]
    pub delete: bool,

    /// With -d: delete the entry under all of its names
    #[arg(long)]
    pub complete: bool,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub confirm: bool,

    /// Arguments of the selected action; with no action flag, a chemical name
    /// to display (or nothing to display the whole library)
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RecipeArgs {
    /// Add a recipe ('-a <recipe_name> (<concentration> <chemical_name>)...') or import a file ('-a <file_name>')
    #[arg(short = 'a', long = "add")]
    pub add: bool,

    /// Delete a recipe ('-d <recipe_name>')
    #[arg(short = 'd', long = "delete")]
    pub delete: bool,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub confirm: bool,

    /// Arguments of the selected action; with no action flag, a recipe name
    /// to display (or nothing to display the whole library)
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct MakeArgs {
    /// The buffer volume ('0.5L'), then either a recipe name or inline
    /// (<concentration> <chemical_name>) pairs
    pub args: Vec<String>,
}

/// Parses the process arguments and runs the selected command.
pub fn run() -> Result<(), BufError> {
    dispatch(Cli::parse())
}

pub fn dispatch(cli: Cli) -> Result<(), BufError> {
    match cli.command {
        Command::Chemical(args) => run_chemical(args),
        Command::Recipe(args) => run_recipe(args),
        Command::Make(args) => run_make(args),
    }
}

fn run_chemical(args: ChemicalArgs) -> Result<(), BufError> {
    if args.add {
        match args.args.len() {
            0 => usage("buf chemical -a <molar_mass> <chemical_names>... | buf chemical -a <file_name>"),
            1 => chemical::add_chemicals_from_file(&args.args[0]),
            _ => chemical::add_single_chemical(&args.args[0], &args.args[1..]),
        }
    } else if args.nickname {
        if args.args.len() < 2 {
            usage("buf chemical -n <existing_name> <new_names>...")
        } else {
            chemical::nickname_chemical(&args.args[0], &args.args[1..])
        }
    } else if args.delete {
        if args.args.len() != 1 {
            usage("buf chemical -d <chemical_name> [--complete] [--confirm]")
        } else {
            chemical::delete_chemical(&args.args[0], args.complete, args.confirm)
        }
    } else {
        match args.args.len() {
            0 => chemical::display_chemical_library(),
            1 => chemical::display_chemical_information(&args.args[0]),
            _ => usage("buf chemical [<chemical_name>]"),
        }
    }
}

fn run_recipe(args: RecipeArgs) -> Result<(), BufError> {
    if args.add {
        match args.args.len() {
            0 => usage("buf recipe -a <recipe_name> (<concentration> <chemical_name>)... | buf recipe -a <file_name>"),
            1 => recipe::add_recipes_from_file(&args.args[0]),
            _ => {
                let (concentrations, chemical_names) = split_pairs(&args.args[1..])
                    .ok_or_else(|| BufError::Usage(
                        "usage: buf recipe -a <recipe_name> (<concentration> <chemical_name>)..."
                            .to_string(),
                    ))?;
                recipe::add_single_recipe(&args.args[0], &concentrations, &chemical_names)
            }
        }
    } else if args.delete {
        if args.args.len() != 1 {
            usage("buf recipe -d <recipe_name> [--confirm]")
        } else {
            recipe::delete_recipe(&args.args[0], args.confirm)
        }
    } else {
        match args.args.len() {
            0 => recipe::display_recipe_library(),
            1 => recipe::display_recipe_information(&args.args[0]),
            _ => usage("buf recipe [<recipe_name>]"),
        }
    }
}

fn run_make(args: MakeArgs) -> Result<(), BufError> {
    match args.args.len() {
        0 | 1 => usage("buf make <volume> <recipe_name> | buf make <volume> (<concentration> <chemical_name>)..."),
        2 => make::make_buffer(&args.args[0], Some(&args.args[1]), &[], &[]),
        _ => {
            let (concentrations, chemical_names) =
                split_pairs(&args.args[1..]).ok_or_else(|| BufError::Usage(
                    "usage: buf make <volume> (<concentration> <chemical_name>)...".to_string(),
                ))?;
            make::make_buffer(&args.args[0], None, &concentrations, &chemical_names)
        }
    }
}

// Splits "300mM NaCl 4M Arginine" style argument runs into concentrations and
// chemical names; None when the run is empty or unpaired.
fn split_pairs(words: &[String]) -> Option<(Vec<String>, Vec<String>)> {
    if words.is_empty() || words.len() % 2 != 0 {
        return None;
    }
    let concentrations = words.iter().step_by(2).cloned().collect();
    let chemical_names = words.iter().skip(1).step_by(2).cloned().collect();
    Some((concentrations, chemical_names))
}

fn usage(text: &str) -> Result<(), BufError> {
    Err(BufError::Usage(format!("usage: {}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chemical_add() {
        let cli = Cli::try_parse_from(["buf", "chemical", "-a", "58.44", "NaCl", "salt"]).unwrap();
        match cli.command {
            Command::Chemical(args) => {
                assert!(args.add);
                assert!(!args.delete);
                assert_eq!(args.args, vec!["58.44", "NaCl", "salt"]);
            }
            _ => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn test_parse_delete_flags() {
        let cli =
            Cli::try_parse_from(["buf", "chemical", "-d", "NaCl", "--complete", "--confirm"])
                .unwrap();
        match cli.command {
            Command::Chemical(args) => {
                assert!(args.delete && args.complete && args.confirm);
                assert_eq!(args.args, vec!["NaCl"]);
            }
            _ => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn test_parse_make() {
        let cli = Cli::try_parse_from(["buf", "make", "0.5L", "300mM", "NaCl"]).unwrap();
        match cli.command {
            Command::Make(args) => assert_eq!(args.args, vec!["0.5L", "300mM", "NaCl"]),
            _ => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn test_split_pairs() {
        let words: Vec<String> = ["300mM", "NaCl", "4M", "Arginine"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (concentrations, chemical_names) = split_pairs(&words).unwrap();
        assert_eq!(concentrations, vec!["300mM", "4M"]);
        assert_eq!(chemical_names, vec!["NaCl", "Arginine"]);

        assert!(split_pairs(&words[..3]).is_none());
        assert!(split_pairs(&[]).is_none());
    }
}
