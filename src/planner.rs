//! Built-in planner for instructions that are already a list of commands,
//! e.g. `navigate example.com; click #login then type #user alice`.

use action_flow::{ActionPlanner, FlowError, PlanRequest};
use action_primitives::Action;
use async_trait::async_trait;
use command_parser::{Command, CommandParser, ParserConfig, UnknownActionPolicy};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CommandListPlanner {
    parser: CommandParser,
}

impl CommandListPlanner {
    pub fn new() -> Self {
        Self {
            parser: CommandParser::new(ParserConfig {
                unknown_action: UnknownActionPolicy::Reject,
                ..ParserConfig::default()
            }),
        }
    }

    pub fn plan_steps(&self, instruction: &str) -> Result<Vec<Action>, FlowError> {
        let steps = split_steps(instruction);
        if steps.is_empty() {
            return Err(FlowError::EmptyPlan(instruction.to_string()));
        }
        steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| match self.parser.parse_body(step) {
                Ok(Command::Action(action)) => Ok(action),
                Ok(Command::Help) => Err(FlowError::InvalidStep {
                    index,
                    reason: "help is not an action".to_string(),
                }),
                Err(err) => Err(FlowError::InvalidStep {
                    index,
                    reason: err.to_string(),
                }),
            })
            .collect()
    }
}

impl Default for CommandListPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionPlanner for CommandListPlanner {
    async fn plan(&self, request: &PlanRequest) -> Result<Vec<Action>, FlowError> {
        debug!(instruction = %request.instruction, "planning command list");
        self.plan_steps(&request.instruction)
    }
}

/// Splits on `;` and on the word `then`.
fn split_steps(instruction: &str) -> Vec<&str> {
    instruction
        .split(';')
        .flat_map(|part| part.split(" then "))
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_on_semicolons_and_then() {
        assert_eq!(
            split_steps("navigate example.com; click #login then type #user alice ;"),
            vec!["navigate example.com", "click #login", "type #user alice"]
        );
    }

    #[test]
    fn each_step_uses_the_command_grammar() {
        let actions = CommandListPlanner::new()
            .plan_steps(r##"click "#go" then wait 250"##)
            .unwrap();
        assert_eq!(
            actions,
            vec![
                Action::Click {
                    selector: "#go".into()
                },
                Action::Wait { duration_ms: 250 },
            ]
        );
    }

    #[test]
    fn unknown_or_empty_steps_fail() {
        let planner = CommandListPlanner::new();
        assert!(matches!(
            planner.plan_steps("click #a; fly away"),
            Err(FlowError::InvalidStep { index: 1, .. })
        ));
        assert!(matches!(planner.plan_steps(" ; "), Err(FlowError::EmptyPlan(_))));
    }
}
