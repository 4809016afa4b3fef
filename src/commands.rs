/// The chemical library: your personal list of chemicals and their molar
/// masses. Supports adding single chemicals or whole files of them, attaching
/// nicknames to an existing entry, deletion, and tabular display.
pub mod chemical;
/// The recipe library: named lists of chemical concentrations such as
/// "300mM NaCl 4M Arginine". Validates every concentration against the unit
/// tables before anything is written.
pub mod recipe;
/// Buffer making: turns a recipe plus a final volume into the amount of each
/// ingredient to add, rendered as a table.
pub mod make;
