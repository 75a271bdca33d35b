/// Control-flow primitives are not `BuiltinFn`s: they need access to the
/// interpreter's `evaluate` and the run's `Environment`, not just their own
/// arguments. The registry only needs to recognize their names so it can
/// route around the built-in/custom dispatch path and so the allow-list
/// check treats them consistently with everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
  Branch,
  Sequence,
  Parallel,
  ForEach,
  SetVariable,
  ExtractJson,
}

impl ControlFlow {
  pub fn name(self) -> &'static str {
    match self {
      ControlFlow::Branch => "branch",
      ControlFlow::Sequence => "sequence",
      ControlFlow::Parallel => "parallel",
      ControlFlow::ForEach => "for_each",
      ControlFlow::SetVariable => "set_variable",
      ControlFlow::ExtractJson => "extract_json",
    }
  }

  pub fn by_name(name: &str) -> Option<Self> {
    Some(match name {
      "branch" => ControlFlow::Branch,
      "sequence" => ControlFlow::Sequence,
      "parallel" => ControlFlow::Parallel,
      "for_each" => ControlFlow::ForEach,
      "set_variable" => ControlFlow::SetVariable,
      "extract_json" => ControlFlow::ExtractJson,
      _ => return None,
    })
  }
}
