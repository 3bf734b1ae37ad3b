//! End-to-end behavior: Lua text in, TypeScript text and source map out.

use luats_transpile::ts::{EmitHook, Emitter, GenPos, NodeId, StmtKind};
use luats_transpile::{
    Options, ProvenanceMap, Transformed, lua, print, transform, transform_lua_to_typescript,
};
use std::collections::BTreeSet;

const PROGRAM: &str = r#"local Stack = {}
Stack.__index = Stack

function Stack.new()
  return setmetatable({ items = {}, size = 0 }, Stack)
end

function Stack:push(value)
  self.size = self.size + 1
  self.items[self.size] = value
end

local function sum(...)
  local total = 0
  for _, v in ipairs({...}) do
    total = total + v
  end
  return total
end

local s = Stack.new()
for i = 1, 10, 2 do
  s:push(i * 2)
end
while s.size > 0 do
  s.size = s.size - 1
end
if sum(1, 2) == 3 then
  print("ok", #s.items)
elseif s.size < 0 then
  error("negative")
else
  print(tostring(nil))
end
local t = { 1, 2, x = "y" }
local a, b = string.upper("q"), math.floor(2.5)
repeat a = a .. "!" until #a > 3
"#;

fn lower(source: &str, options: Options) -> Transformed {
    let chunk = lua::parse(source).expect("parse failed");
    transform(&chunk, &options)
}

fn module() -> Options {
    Options {
        module: true,
        ..Options::default()
    }
}

/// Records, for every mapped node, where it starts in the output and which
/// origin a lookup there should find: its own, or that of the outermost
/// mapped ancestor starting at the same position.
struct Starts<'p> {
    provenance: &'p ProvenanceMap,
    stack: Vec<(NodeId, GenPos)>,
    expected: Vec<(GenPos, (u32, u32))>,
}

impl EmitHook for Starts<'_> {
    fn enter(&mut self, id: NodeId, at: GenPos) {
        self.stack.push((id, at));
        if self.provenance.get(id).is_none() {
            return;
        }
        let winner = self
            .stack
            .iter()
            .find(|(node, start)| *start == at && self.provenance.get(*node).is_some())
            .map_or(id, |(node, _)| *node);
        if let Some(origin) = self.provenance.get(winner) {
            let start = origin.start();
            self.expected.push((at, (start.line, start.column)));
        }
    }

    fn exit(&mut self, _id: NodeId, _at: GenPos) {
        self.stack.pop();
    }
}

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn statements_map_to_their_lines() {
        let file =
            transform_lua_to_typescript("local x = 1\nprint(x)", &Options::default(), "main.lua")
                .unwrap();
        insta::assert_snapshot!(file.ts_code, @r"
        let x = 1;
        console.log(x);
        ");
        assert!(file.diagnostics.is_empty());

        let first = file.source_map.original_position_for(1, 0).unwrap();
        assert_eq!((first.source, first.line, first.column), ("main.lua", 1, 0));
        let second = file.source_map.original_position_for(2, 0).unwrap();
        assert_eq!((second.line, second.column), (2, 0));
        // `x` in `console.log(x)`
        let argument = file.source_map.original_position_for(2, 12).unwrap();
        assert_eq!((argument.line, argument.column), (2, 6));
    }

    #[test]
    fn supported_program_has_no_diagnostics() {
        let file =
            transform_lua_to_typescript(PROGRAM, &Options::default(), "stack.lua").unwrap();
        assert_eq!(file.diagnostics, Vec::<String>::new());
        assert!(file.ts_code.contains("Stack.push = function (value) {\n    this.size = this.size + 1;"));
        assert!(file.ts_code.contains("for (let i = 1; i <= 10; i += 2) {\n    s.push(i * 2);\n}"));
        assert!(file.ts_code.contains("} while (!(a.length > 3));"));
    }

    #[test]
    fn unsupported_constructs_are_named() {
        let file = transform_lua_to_typescript(
            "goto skip\nprint(1)\n::skip::",
            &Options::default(),
            "jump.lua",
        )
        .unwrap();
        assert_eq!(file.diagnostics.len(), 2);
        assert!(file.diagnostics[0].contains("goto"), "{:?}", file.diagnostics);
        assert!(file.diagnostics[1].contains("label"), "{:?}", file.diagnostics);
        assert!(file.ts_code.contains("console.log(1);"));

        let file = transform_lua_to_typescript(
            "setmetatable(v, { __add = function(a, b) return a end })",
            &Options::default(),
            "meta.lua",
        )
        .unwrap();
        assert_eq!(file.diagnostics.len(), 1);
        assert!(file.diagnostics[0].contains("__add"), "{:?}", file.diagnostics);
        assert!(!file.ts_code.is_empty());
    }

    #[test]
    fn semantic_warnings_need_the_option() {
        let source = "local n = #t";
        let quiet = transform_lua_to_typescript(source, &Options::default(), "a.lua").unwrap();
        assert!(quiet.diagnostics.is_empty());

        let options = Options {
            show_semantic_errors: true,
            ..Options::default()
        };
        let loud = transform_lua_to_typescript(source, &options, "a.lua").unwrap();
        assert_eq!(loud.diagnostics.len(), 1);
        assert!(loud.diagnostics[0].starts_with("1:10: "), "{:?}", loud.diagnostics);
        assert_eq!(loud.ts_code, quiet.ts_code);
    }
}

mod configuration {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn module_only_changes_top_level_wrapping() {
        let source = "local M = {}\nfunction M.f() return 1 end\nreturn M";
        let script = transform_lua_to_typescript(source, &Options::default(), "m.lua").unwrap();
        let module = transform_lua_to_typescript(source, &module(), "m.lua").unwrap();

        insta::assert_snapshot!(script.ts_code, @r"
        let M = {};
        M.f = function () {
            return 1;
        };
        ");
        let export = module
            .ts_code
            .strip_prefix(script.ts_code.as_str())
            .expect("module output extends the script output");
        assert_eq!(export, "export default M;\n");
    }

    #[test]
    fn module_without_return_is_still_a_module() {
        let file = transform_lua_to_typescript("print(1)", &module(), "m.lua").unwrap();
        assert_eq!(file.ts_code, "console.log(1);\nexport {};\n");
    }

    #[test]
    fn classmod_gathers_local_functions() {
        let source = "\
local function a() return 1 end
local function b() return 2 end
local function c() return a() + b() end
";
        let options = Options {
            classmod: true,
            ..Options::default()
        };
        let transformed = lower(source, options);
        let classes: Vec<_> = transformed
            .program
            .body
            .iter()
            .filter_map(|stmt| match &stmt.kind {
                StmtKind::ExportDefaultClass(class) => Some(class),
                _ => None,
            })
            .collect();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].members.len(), 3);

        insta::assert_snapshot!(Emitter::emit(&transformed.program), @r"
        export default class Module {
            static a() {
                return 1;
            }
            static b() {
                return 2;
            }
            static c() {
                return Module.a() + Module.b();
            }
        }
        ");
    }
}

mod source_maps {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check_round_trip(source: &str, options: Options) {
        let transformed = lower(source, options);
        let output = print(&transformed.program, &transformed.provenance, "in.lua", None);

        let mut emitter = Emitter::with_hook(Starts {
            provenance: &transformed.provenance,
            stack: Vec::new(),
            expected: Vec::new(),
        });
        emitter.write_program(&transformed.program);
        let (code, starts) = emitter.finish();
        assert_eq!(code, output.code);
        assert!(!starts.expected.is_empty());

        for (at, origin) in starts.expected {
            let found = output
                .map
                .original_position_for(at.line + 1, at.column)
                .map(|p| (p.line, p.column));
            assert_eq!(found, Some(origin), "node starting at {at:?}");
        }
    }

    #[test]
    fn every_mapped_node_resolves_to_its_origin() {
        check_round_trip(PROGRAM, Options::default());
        check_round_trip(PROGRAM, module());
        check_round_trip(
            PROGRAM,
            Options {
                classmod: true,
                ..Options::default()
            },
        );
    }

    #[test]
    fn segments_only_point_at_origins() {
        let transformed = lower(PROGRAM, Options::default());
        let output = print(&transformed.program, &transformed.provenance, "in.lua", None);
        let origins: BTreeSet<(u32, u32)> = transformed
            .provenance
            .iter()
            .filter_map(|(_, provenance)| provenance.origin())
            .map(|origin| (origin.start().line, origin.start().column))
            .collect();

        let mut previous = None;
        for mapping in &output.map.mappings {
            let at = (mapping.generated_line, mapping.generated_column);
            assert!(previous < Some(at), "segments out of order at {at:?}");
            previous = Some(at);
            if let Some(original) = mapping.original {
                assert!(origins.contains(&(original.line, original.column)));
            }
        }
    }

    #[test]
    fn synthetic_helpers_have_no_segments() {
        let transformed = lower("goto done\n::done::", Options::default());
        let output = print(&transformed.program, &transformed.provenance, "in.lua", None);
        assert!(output.code.starts_with("function __unsupported(construct) {\n"));

        // the helper declaration spans the first three lines
        assert!(!output.map.mappings.is_empty());
        for mapping in &output.map.mappings {
            assert!(mapping.generated_line >= 3, "{mapping:?}");
        }
    }

    #[test]
    fn json_survives_a_round_trip() {
        let file = transform_lua_to_typescript(PROGRAM, &Options::default(), "stack.lua").unwrap();
        let json = file.source_map.to_json().unwrap();
        let parsed = luats_transpile::SourceMap::from_json(&json).unwrap();
        assert_eq!(parsed, file.source_map);
    }
}

mod determinism {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn same_input_same_output() {
        for options in [Options::default(), module()] {
            let first = transform_lua_to_typescript(PROGRAM, &options, "stack.lua").unwrap();
            let second = transform_lua_to_typescript(PROGRAM, &options, "stack.lua").unwrap();
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }

    #[test]
    fn temporaries_restart_per_file() {
        let source = "for i = 1, f() do end";
        let first = transform_lua_to_typescript(source, &Options::default(), "a.lua").unwrap();
        let second = transform_lua_to_typescript(source, &Options::default(), "b.lua").unwrap();
        assert!(first.ts_code.starts_with("const _t1 = f();"));
        assert_eq!(first.ts_code, second.ts_code);
    }
}
