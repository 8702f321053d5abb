use super::{EditorToolName, MapEditorTool};

/// Selected while the editor is being closed. Does nothing.
#[derive(Debug, Default)]
pub struct CloseTool;

#[async_trait::async_trait]
impl MapEditorTool for CloseTool {
    fn name(&self) -> EditorToolName {
        EditorToolName::CloseMapEditor
    }
}
