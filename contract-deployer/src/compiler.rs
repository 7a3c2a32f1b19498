use ethers_core::{abi::Abi, types::Bytes};
use ethers_solc::{
    artifacts::{output_selection::OutputSelection, Settings, Source, Sources},
    error::SolcError,
    CompilerInput, CompilerOutput, Solc,
};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Name of the source unit a deployment request must contain. The contract
/// to deploy is looked up inside its compiled namespace.
pub const ENTRY_FILE: &str = "index";

const ENTRY_PATH: &str = "index.sol";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub code: String,
}

/// The deployable artifact extracted from the compiler output.
#[derive(Debug, Clone)]
pub struct CompiledContract {
    pub name: String,
    pub abi: Abi,
    /// ABI as the compiler emitted it, returned to the caller verbatim.
    pub abi_json: serde_json::Value,
    pub bytecode: Bytes,
}

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("1 or more important files seem to be missing from this request. Kindly check and revert.")]
    MissingEntryFile,
    #[error("Compilation error: {0:?}")]
    Compilation(Vec<String>),
    #[error("contract `{0}` was not found in `{ENTRY_PATH}`")]
    ContractNotFound(String),
    #[error("`{ENTRY_PATH}` declares several contracts ({0:?}); pass `contractTitle` to pick one")]
    AmbiguousContract(Vec<String>),
    #[error("{0}")]
    Solc(#[from] SolcError),
}

/// How the `solc` binary is located. Resolution happens once at startup.
#[derive(Debug, Clone, Default)]
pub struct SolcConfig {
    pub solc_path: Option<PathBuf>,
    pub solc_version: Option<String>,
}

impl SolcConfig {
    pub fn resolve(&self) -> Result<Solc, SolcError> {
        if let Some(path) = &self.solc_path {
            return Ok(Solc::new(path));
        }
        if let Some(version) = &self.solc_version {
            return Solc::find_or_install_svm_version(version);
        }
        Ok(Solc::default())
    }
}

/// Builds a single compilation unit from all submitted files, each as
/// `<name>.sol`, requesting the complete output selection.
pub fn compiler_input(files: &[SourceFile]) -> Result<CompilerInput, CompileError> {
    if !files.iter().any(|file| file.name == ENTRY_FILE) {
        return Err(CompileError::MissingEntryFile);
    }

    let sources: Sources = files
        .iter()
        .map(|file| {
            (
                PathBuf::from(format!("{}.sol", file.name)),
                Source::new(file.code.clone()),
            )
        })
        .collect();

    let mut settings = Settings::default();
    settings.output_selection = OutputSelection::complete_output_selection();

    Ok(CompilerInput {
        language: "Solidity".to_string(),
        sources,
        settings,
    })
}

pub fn compile(solc: &Solc, files: &[SourceFile]) -> Result<CompilerOutput, CompileError> {
    let input = compiler_input(files)?;
    let output: CompilerOutput = solc.compile(&input)?;

    let diagnostics: Vec<String> = output
        .errors
        .iter()
        .filter(|error| error.severity.is_error())
        .map(|error| {
            error
                .formatted_message
                .clone()
                .unwrap_or_else(|| error.message.clone())
        })
        .collect();
    if !diagnostics.is_empty() {
        return Err(CompileError::Compilation(diagnostics));
    }

    Ok(output)
}

/// Picks the deployable contract out of `index.sol`'s namespace.
///
/// An explicit `contract_title` always wins; without one the file must
/// declare exactly one contract — guessing between several would deploy
/// whatever happens to sort first.
pub fn select_contract(
    output: &CompilerOutput,
    contract_title: Option<&str>,
) -> Result<CompiledContract, CompileError> {
    let contracts = output.contracts.get(ENTRY_PATH).ok_or_else(|| {
        CompileError::Compilation(vec![format!("no usable contract in `{ENTRY_PATH}`")])
    })?;

    let name = match contract_title {
        Some(title) => {
            if !contracts.contains_key(title) {
                return Err(CompileError::ContractNotFound(title.to_string()));
            }
            title.to_string()
        }
        None => {
            let mut names = contracts.keys().cloned();
            match (names.next(), names.next()) {
                (Some(name), None) => name,
                (Some(_), Some(_)) => {
                    return Err(CompileError::AmbiguousContract(
                        contracts.keys().cloned().collect(),
                    ))
                }
                _ => {
                    return Err(CompileError::Compilation(vec![format!(
                        "no usable contract in `{ENTRY_PATH}`"
                    )]))
                }
            }
        }
    };

    let contract = &contracts[&name];
    let abi = contract.abi.as_ref().ok_or_else(|| {
        CompileError::Compilation(vec![format!("contract `{name}` has no abi in the output")])
    })?;
    let bytecode = contract
        .evm
        .as_ref()
        .and_then(|evm| evm.bytecode.as_ref())
        .and_then(|bytecode| bytecode.object.clone().into_bytes())
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| {
            CompileError::Compilation(vec![format!(
                "contract `{name}` has no deployable bytecode (abstract contract or unlinked library?)"
            )])
        })?;

    Ok(CompiledContract {
        name,
        abi: abi.abi.clone(),
        abi_json: abi.abi_value.clone(),
        bytecode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn files(entries: &[(&str, &str)]) -> Vec<SourceFile> {
        entries
            .iter()
            .map(|(name, code)| SourceFile {
                name: name.to_string(),
                code: code.to_string(),
            })
            .collect()
    }

    #[test]
    fn input_contains_all_files_as_sol_units() {
        let input = compiler_input(&files(&[
            ("index", "contract C {}"),
            ("lib", "library L {}"),
        ]))
        .expect("valid input");
        assert_eq!(input.language, "Solidity");
        let paths: Vec<_> = input
            .sources
            .keys()
            .map(|path| path.to_string_lossy().to_string())
            .collect();
        assert_eq!(paths, vec!["index.sol".to_string(), "lib.sol".to_string()]);
    }

    #[test]
    fn missing_entry_file_is_rejected() {
        let err = compiler_input(&files(&[("main", "contract C {}")])).unwrap_err();
        assert!(matches!(err, CompileError::MissingEntryFile));
    }

    fn output(json: &str) -> CompilerOutput {
        serde_json::from_str(json).expect("valid compiler output")
    }

    const SINGLE_CONTRACT: &str = r#"{
        "contracts": {
            "index.sol": {
                "C": { "abi": [], "evm": { "bytecode": { "object": "6001" } } }
            }
        }
    }"#;

    const TWO_CONTRACTS: &str = r#"{
        "contracts": {
            "index.sol": {
                "A": { "abi": [], "evm": { "bytecode": { "object": "6001" } } },
                "B": { "abi": [], "evm": { "bytecode": { "object": "6002" } } }
            }
        }
    }"#;

    #[test]
    fn single_contract_is_selected_without_title() {
        let contract = select_contract(&output(SINGLE_CONTRACT), None).expect("selected");
        assert_eq!(contract.name, "C");
        assert_eq!(contract.bytecode.to_vec(), vec![0x60, 0x01]);
    }

    #[test]
    fn ambiguous_namespace_requires_title() {
        let err = select_contract(&output(TWO_CONTRACTS), None).unwrap_err();
        assert!(matches!(err, CompileError::AmbiguousContract(names) if names.len() == 2));

        let contract = select_contract(&output(TWO_CONTRACTS), Some("B")).expect("selected");
        assert_eq!(contract.name, "B");
    }

    #[test]
    fn unknown_title_is_rejected() {
        let err = select_contract(&output(SINGLE_CONTRACT), Some("Missing")).unwrap_err();
        assert!(matches!(err, CompileError::ContractNotFound(name) if name == "Missing"));
    }

    #[test]
    fn contract_without_bytecode_is_rejected() {
        let json = r#"{
            "contracts": {
                "index.sol": {
                    "I": { "abi": [], "evm": { "bytecode": { "object": "" } } }
                }
            }
        }"#;
        let err = select_contract(&output(json), None).unwrap_err();
        assert!(matches!(err, CompileError::Compilation(_)));
    }
}
