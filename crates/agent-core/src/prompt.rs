//! ReAct Prompts
//!
//! System instruction and per-iteration user prompt for the Thought/Action/Observation loop.

/// Protocol instruction sent as the system message on every call
pub const REACT_SYSTEM_PROMPT: &str = r"You are an AI question answering expert who runs in a loop of Thought, Action, PAUSE and Observation.

Given a question, along with all your previous steps, think and reason, and then take action.

You should always generate a thought with sound reasoning and then choose an appropriate action.";

const WORKED_EXAMPLE: &str = r#"Here is an example session:
#######################################################################################################################
You will initially be called with:
QUESTION:
Which entity is currently engaged with Amazon to address competition concerns, facilitating dialogue with consumer groups against Meta, deploying staff within its AI Office for future regulations, and has previously focused on illegal content and disinformation issues related to the Israel-Hamas war, as reported by TechCrunch?

And you respond as:
```
{
    "thought": "Let's break the question down. First I need the entity engaged with Amazon over competition concerns, then the one facilitating dialogue with consumer groups against Meta, then the one deploying staff within its AI Office, and finally the one focused on illegal content related to the Israel-Hamas war.",
    "action": "retrieve",
    "input": "entity engaged with Amazon to address competition concerns, TechCrunch"
}
```

Then you will again be called with:
Observation 1:
Title: Amazon's iRobot purchase sucks up formal competition concerns in EU
Source: TechCrunch
Published_at: 2023-11-27T23:29:10+00:00

We continue to work through the process with the European Commission and are focused on addressing its questions and any identified concerns at this stage.

And you respond as:
```
{
    "thought": "The European Commission is engaged with Amazon. Next I need the entity facilitating dialogue with consumer groups against Meta.",
    "action": "retrieve",
    "input": "entity facilitating dialogue with consumer groups against Meta, TechCrunch"
}
```

... and so on, one retrieval per step, until every part is answered:
```
{
    "thought": "Every clue points to the European Commission.",
    "action": "finish",
    "input": "European Commission"
}
```

The loop ends when you decide to choose the action "finish".
#######################################################################################################################"#;

/// Render the user prompt for one iteration
pub fn render_iteration_prompt(query: &str, history: &str, capabilities: &str) -> String {
    format!(
        r#"**IMPORTANT**: Strictly return only the JSON formatted results without any surrounding text.

Given the question:
{query}

Here are your previous steps:
{history}

Thoroughly analyse the observations from your steps, and then take an action to reach towards the final answer for the given question. Whenever stuck or not finding correct context, strictly ask for Human assistance and follow what the human tells you.

DO NOT RETRIEVE 2 DIFFERENT ARTICLES AT ONCE, ALWAYS DO IT STEP BY STEP.

Here are the tools that you can choose from along with their descriptions. YOU ARE ALLOWED TO CHOOSE ONLY ONE OF THESE ACTIONS, DO NOT REQUEST OTHER ACTIONS:
{capabilities}

Return your answer in the below JSON format:

```
{{
    "thought": <your thought/reasoning>,
    "action": <the action you want to take next>,
    "input": <the input parameters that the action requires as per the description>
}}
```

If you don't know the answer or you are not sure, even after asking for human help, return the final answer as "I don't know".

{WORKED_EXAMPLE}
"#
    )
}
