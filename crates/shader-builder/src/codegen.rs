use anyhow::Context;
use proc_macro2::TokenStream;
use quote::quote;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct CodegenOptions {
	/// file name within `OUT_DIR`
	pub registry_path: String,
	/// path of the `fxed-nri` crate as seen from the including crate
	pub crate_path: String,
}

impl Default for CodegenOptions {
	fn default() -> Self {
		Self {
			registry_path: String::from("shader_registry.rs"),
			crate_path: String::from("fxed_nri"),
		}
	}
}

/// All `*.spv` files directly within `cache_dir` as `(file name, absolute path)`, sorted by name. A missing
/// directory has no files.
pub fn find_spv_files(cache_dir: &Path) -> anyhow::Result<Vec<(String, PathBuf)>> {
	if !cache_dir.is_dir() {
		return Ok(Vec::new());
	}
	let mut files = Vec::new();
	for entry in WalkDir::new(cache_dir).min_depth(1).max_depth(1) {
		let entry = entry?;
		let path = entry.path();
		if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "spv") {
			let name = entry.file_name().to_string_lossy().into_owned();
			let path = fs::canonicalize(path).with_context(|| format!("Failed to resolve {}", path.display()))?;
			files.push((name, path));
		}
	}
	files.sort();
	Ok(files)
}

/// The tokens of a `pub static SHADER_REGISTRY` embedding each `(name, path)` binary under `name`.
pub fn shader_registry_tokens<'a>(
	shaders: impl Iterator<Item = (&'a str, &'a Path)>,
	options: &CodegenOptions,
) -> anyhow::Result<TokenStream> {
	let crate_path = syn::parse_str::<syn::Path>(&options.crate_path)?;
	let entries = shaders
		.map(|(name, path)| {
			let path = path
				.to_str()
				.with_context(|| format!("Shader path {} is not valid UTF-8", path.display()))?;
			Ok(quote!((#name, include_bytes!(#path) as &[u8])))
		})
		.collect::<anyhow::Result<Vec<_>>>()?;
	Ok(quote! {
		pub static SHADER_REGISTRY: #crate_path::shader::ShaderRegistry =
			#crate_path::shader::ShaderRegistry::new(&[#(#entries),*]);
	})
}

pub fn codegen_shader_registry<'a>(
	shaders: impl Iterator<Item = (&'a str, &'a Path)>,
	out_path: &Path,
	options: &CodegenOptions,
) -> anyhow::Result<()> {
	let tokens = shader_registry_tokens(shaders, options)?;

	// when pretty printing fails, always write plain version, then error
	let (content, error) = codegen_try_pretty_print(tokens);
	fs::write(out_path, content)?;
	eprintln!("Shader registry written to {}", out_path.display());
	if let Some(e) = error { Err(e)? } else { Ok(()) }
}

#[cfg(not(feature = "use-pretty-print"))]
pub fn codegen_try_pretty_print(tokens: TokenStream) -> (String, Option<syn::Error>) {
	(tokens.to_string(), None)
}

#[cfg(feature = "use-pretty-print")]
pub fn codegen_try_pretty_print(tokens: TokenStream) -> (String, Option<syn::Error>) {
	match syn::parse2(tokens.clone()) {
		Ok(parse) => (prettyplease::unparse(&parse), None),
		Err(e) => (tokens.to_string(), Some(e)),
	}
}
