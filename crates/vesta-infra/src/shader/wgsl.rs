// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use vesta_core::renderer::{ShaderCompiler, ShaderError, ShaderIl, ShaderStage};

/// A [`ShaderCompiler`] whose IL is normalized WGSL text.
///
/// The wgpu backend consumes WGSL directly, so "compiling" means rejecting
/// sources that can never produce a module for the requested stage and
/// normalizing the text so equal programs produce equal IL. Full semantic
/// validation happens when the device creates the module.
#[derive(Debug, Clone, Default)]
pub struct WgslShaderCompiler {
    /// Entry points that must exist, per stage. Empty means "any".
    required_entry_points: Vec<(ShaderStage, String)>,
}

impl WgslShaderCompiler {
    /// Creates a compiler that only checks the stage attribute.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also require a function named `entry_point` for `stage`.
    pub fn require_entry_point(mut self, stage: ShaderStage, entry_point: impl Into<String>) -> Self {
        self.required_entry_points.push((stage, entry_point.into()));
        self
    }

    fn error(stage: ShaderStage, uri: &str, details: impl Into<String>) -> ShaderError {
        ShaderError::CompilationError {
            label: uri.to_string(),
            stage,
            details: details.into(),
        }
    }
}

fn stage_attribute(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "@vertex",
        ShaderStage::Fragment => "@fragment",
        ShaderStage::Compute => "@compute",
    }
}

/// Removes comments and normalizes line endings. Nested block comments are
/// honoured as in WGSL. Returns the text and, on failure, the line of an
/// unterminated block comment.
fn strip_comments(source: &str) -> Result<String, usize> {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut depth = 0usize;
    let mut line = 1usize;
    let mut opened_at = 0usize;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }
        match (depth, c, chars.peek().copied()) {
            (_, '/', Some('*')) => {
                chars.next();
                if depth == 0 {
                    opened_at = line;
                }
                depth += 1;
            }
            (1.., '*', Some('/')) => {
                chars.next();
                depth -= 1;
                out.push(' ');
            }
            (0, '/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        line += 1;
                        out.push('\n');
                        break;
                    }
                }
            }
            (0, '\r', Some('\n')) => {}
            (0, c, _) => out.push(c),
            (_, '\n', _) => out.push('\n'),
            _ => {}
        }
    }

    if depth > 0 {
        Err(opened_at)
    } else {
        Ok(out)
    }
}

/// Checks bracket nesting, returning the line of the first mismatch.
fn check_brackets(text: &str) -> Result<(), (usize, char)> {
    let mut stack = Vec::new();
    let mut line = 1;
    for c in text.chars() {
        match c {
            '\n' => line += 1,
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return Err((line, c));
                }
            }
            _ => {}
        }
    }
    match stack.last() {
        Some(&open) => Err((line, open)),
        None => Ok(()),
    }
}

/// Returns `true` if `fn name` is declared in `text`.
fn declares_function(text: &str, name: &str) -> bool {
    let tokens: Vec<&str> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .collect();
    tokens.windows(2).any(|pair| pair[0] == "fn" && pair[1] == name)
}

impl ShaderCompiler for WgslShaderCompiler {
    fn create_shader_il(
        &self,
        stage: ShaderStage,
        source: &[u8],
        uri: &str,
    ) -> Result<ShaderIl, ShaderError> {
        let source = source.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(source);
        let text = std::str::from_utf8(source)
            .map_err(|e| Self::error(stage, uri, format!("Source is not UTF-8: {e}")))?;

        let code = strip_comments(text).map_err(|line| {
            Self::error(stage, uri, format!("Unterminated block comment opened on line {line}"))
        })?;
        check_brackets(&code).map_err(|(line, c)| {
            Self::error(stage, uri, format!("Unbalanced '{c}' on line {line}"))
        })?;

        let attribute = stage_attribute(stage);
        if !code.contains(attribute) {
            return Err(Self::error(
                stage,
                uri,
                format!("No {attribute} entry point declared"),
            ));
        }
        for (required_stage, entry_point) in &self.required_entry_points {
            if *required_stage == stage && !declares_function(&code, entry_point) {
                return Err(Self::error(
                    stage,
                    uri,
                    format!("Missing entry point '{entry_point}'"),
                ));
            }
        }

        // The IL keeps comments (naga reports spans against them) but uses
        // LF line endings so checkouts on any platform hash the same.
        let normalized = text.replace("\r\n", "\n");
        log::debug!(
            "WgslShaderCompiler: Compiled '{}' ({:?}, {} bytes)",
            uri,
            stage,
            normalized.len()
        );
        Ok(ShaderIl::new(stage, normalized.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
// Fullscreen triangle.
@vertex
fn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    let x = f32(i32(i) - 1);
    return vec4<f32>(x, 0.0, 0.0, 1.0);
}
";

    #[test]
    fn accepts_a_vertex_shader() {
        let compiler = WgslShaderCompiler::new().require_entry_point(ShaderStage::Vertex, "vs_main");
        let il = compiler
            .create_shader_il(ShaderStage::Vertex, TRIANGLE.as_bytes(), "tri.vert.wgsl")
            .unwrap();
        assert_eq!(il.stage, ShaderStage::Vertex);
        assert_eq!(&*il.code, TRIANGLE.as_bytes());
    }

    #[test]
    fn rejects_the_wrong_stage() {
        let err = WgslShaderCompiler::new()
            .create_shader_il(ShaderStage::Fragment, TRIANGLE.as_bytes(), "tri.wgsl")
            .unwrap_err();
        assert!(err.to_string().contains("No @fragment entry point"));
    }

    #[test]
    fn attribute_inside_a_comment_does_not_count() {
        let source = "/* @fragment */ fn fs_main() {}";
        assert!(WgslShaderCompiler::new()
            .create_shader_il(ShaderStage::Fragment, source.as_bytes(), "c.wgsl")
            .is_err());
    }

    #[test]
    fn reports_unbalanced_brackets_with_line() {
        let source = "@compute @workgroup_size(1)\nfn main() {\n    let a = 1);\n}\n";
        let err = WgslShaderCompiler::new()
            .create_shader_il(ShaderStage::Compute, source.as_bytes(), "c.comp.wgsl")
            .unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn crlf_and_bom_normalize_to_the_same_il() {
        let compiler = WgslShaderCompiler::new();
        let unix = compiler
            .create_shader_il(ShaderStage::Vertex, TRIANGLE.as_bytes(), "a")
            .unwrap();
        let mut windows = b"\xEF\xBB\xBF".to_vec();
        windows.extend_from_slice(TRIANGLE.replace('\n', "\r\n").as_bytes());
        let windows = compiler
            .create_shader_il(ShaderStage::Vertex, &windows, "a")
            .unwrap();
        assert_eq!(unix.code, windows.code);
    }

    #[test]
    fn missing_required_entry_point() {
        let compiler = WgslShaderCompiler::new().require_entry_point(ShaderStage::Vertex, "main");
        assert!(compiler
            .create_shader_il(ShaderStage::Vertex, TRIANGLE.as_bytes(), "a")
            .is_err());
    }

    #[test]
    fn non_utf8_and_unterminated_comments_fail() {
        let compiler = WgslShaderCompiler::new();
        assert!(compiler
            .create_shader_il(ShaderStage::Vertex, &[0xff, 0xfe], "a")
            .is_err());
        let err = compiler
            .create_shader_il(ShaderStage::Vertex, b"@vertex\n/* /* */ fn", "a")
            .unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }
}
