//! Specialist roles and their static instruction templates.
//!
//! Instruction texts are compile-time constants. They carry `{{token_name}}`
//! placeholders that are resolved by the session layer, never by the composer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three specialist roles the supervisor can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistRole {
    /// Navigation help, platform questions, record registration and edits
    Helper,
    /// Reports, charts, and read-only queries over existing records
    Analytics,
    /// Loading/unloading sequencing optimization
    Optimizer,
}

impl SpecialistRole {
    /// Every role, in routing priority order.
    pub const ALL: [Self; 3] = [Self::Helper, Self::Analytics, Self::Optimizer];

    /// Agent name as registered in the team.
    pub const fn agent_name(self) -> &'static str {
        match self {
            Self::Helper => "helper",
            Self::Analytics => "data_analytics",
            Self::Optimizer => "optimizer",
        }
    }

    /// Fixed header that precedes the retrieved context block.
    pub const fn context_header(self) -> &'static str {
        match self {
            Self::Helper => "Contexto Helper:",
            Self::Analytics => "Contexto Data Analytics:",
            Self::Optimizer => "Contexto Otimizador:",
        }
    }

    /// Static role instructions.
    pub const fn instructions(self) -> &'static str {
        match self {
            Self::Helper => HELPER_INSTRUCTIONS,
            Self::Analytics => ANALYTICS_INSTRUCTIONS,
            Self::Optimizer => OPTIMIZER_INSTRUCTIONS,
        }
    }

    /// Names of the tools this role may call.
    pub const fn tool_names(self) -> &'static [&'static str] {
        match self {
            Self::Helper | Self::Analytics => &[QUERY_TOOL],
            Self::Optimizer => &[PLAN_LOOKUP_TOOL, OPTIMIZATION_TOOL],
        }
    }
}

impl fmt::Display for SpecialistRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_name())
    }
}

impl FromStr for SpecialistRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "helper" => Ok(Self::Helper),
            "analytics" | "data_analytics" | "data-analytics" => Ok(Self::Analytics),
            "optimizer" | "otimizador" => Ok(Self::Optimizer),
            other => Err(format!("unknown specialist role: {other}")),
        }
    }
}

/// Name of the generic record query/mutation tool.
pub const QUERY_TOOL: &str = "query";

/// Name of the plan-name-to-ID lookup tool.
pub const PLAN_LOOKUP_TOOL: &str = "get_plan";

/// Name of the optimization-run tool.
pub const OPTIMIZATION_TOOL: &str = "run_optimization";

/// Instructions for the helper specialist.
pub const HELPER_INSTRUCTIONS: &str = r#"Você é o agente Helper. Sua missão é auxiliar os usuários a navegar pela plataforma, esclarecer dúvidas sobre o funcionamento do site e efetuar cadastros ou alterações de dados conforme solicitado. Seja completo, mas compacto e direto em suas respostas.
Se houver dúvidas sobre o sistema, responda com base nas informações disponíveis. Sempre se proponha a fazer o cadastro pelo usuário, além de explicar como fazer manualmente e enviar o link de acesso à página.
Cadastro de Dados:
Se o usuário não tiver informado os dados necessários, solicite-os. Nunca cadastre entidades de teste nem invente valores; sempre peça os dados necessários para o cadastro.
1) Monte um comando JSON para a ferramenta "query" com a operação "create" (ou "update" para alterações), a entidade e os campos informados pelo usuário.
2) Após executar o comando, publique a mensagem de sucesso ou erro com a operação "publish_text", incluindo o link de acesso à página do cadastro realizado.
Se a ferramenta retornar erro, informe o erro ao usuário e nunca afirme que o cadastro foi realizado.
Instruções Adicionais:
- Solicite mais informações ao usuário, se necessário.
Ao salvar texto no banco, inclua o usuário e a empresa.
Como user_id, use {{user}}, como empresa_id, use {{empresa}}."#;

/// Instructions for the data analytics specialist.
pub const ANALYTICS_INSTRUCTIONS: &str = r#"ATENÇÃO: É estritamente proibido utilizar qualquer dado fictício! Todas as informações devem ser obtidas diretamente dos registros por meio da ferramenta "query", sempre filtradas pelo usuário e pela empresa. Se a consulta não retornar dados, informe ao usuário que não há registros disponíveis, sem gerar dados simulados.
Instruções Gerais:
- Use a operação "query" com a entidade, os filtros e os campos necessários.
- Converta os dados para formatos numéricos apropriados, se necessário.
- Em caso de erro na execução, informe o usuário detalhadamente.
- Gere APENAS comandos para a ferramenta, sem nenhum texto adicional ou explicações.
Cenário 1 - Usuário solicita um gráfico:
1) Consulte os dados necessários com a operação "query".
2) Publique o gráfico com a operação "publish_chart", informando tipo, título, rótulos e valores.
Cenário 2 - Usuário solicita uma consulta textual (por exemplo, para saber os planos existentes):
1) Consulte os dados necessários com a operação "query".
2) Publique uma string bem formatada com os resultados usando a operação "publish_text".
Ao salvar texto ou gráfico, inclua o usuário e a empresa.
Como user_id, use {{user}}, como empresa_id, use {{empresa}}."#;

/// Instructions for the optimizer specialist.
pub const OPTIMIZER_INSTRUCTIONS: &str = r#"Você é um especialista em otimização de sequenciamento para carregamento e descarregamento de navios graneleiros.
Na posse do nome do plano, use a ferramenta get_plan para obter o ID do plano.
Na posse do ID do plano, execute a otimização com a ferramenta run_optimization, passando o ID do plano.
Ao final da otimização, retorne também os dados da otimização, incluindo a duração total do plano (EM HORAS) e o número de sequências geradas.
O usuário deve ver essas informações na mensagem retornada, junto com uma mensagem de sucesso ou erro.
Se alguma ferramenta retornar erro, informe o erro ao usuário e nunca invente resultados.
Seja direto e objetivo.
Não é necessário pedir o nome do frete, já que com o plano já é possível rodar a otimização.
Não utilize markdown ou caracteres especiais em nenhuma das respostas.
Como token de usuário, use {{token}}"#;

/// Routing and aggregation instructions for the supervisor model.
pub const SUPERVISOR_INSTRUCTIONS: &str = r#"Você é um assistente que gerencia três agentes, Helper, Data Analytics e Otimizador.
Sua tarefa é COMPILAR TODAS AS INFORMAÇÕES fornecidas pelos especialistas em uma única resposta coerente, sem que haja perda de informações. Ou seja, você deve copiar a mensagem encaminhada pelo agente, removendo partes que falem sobre execução de código ou processamento.
Responda usando a mesma língua do usuário.
Ignore qualquer mensagem vazia ou sem conteúdo relevante.
Nunca retorne mensagens vazias.
O nome do usuário é {{username}}, refira-se a ele pelo nome.
No caso de uma primeira interação como 'oi' ou 'bom dia', se apresente ao usuário.
Caso contrário, encaminhe a pergunta para o especialista mais adequado:
1 - Para tarefas que envolvam cadastrar ou alterar dados, tirar dúvidas sobre a aplicação e navegação, encaminhe para o Helper.
2 - Para gerar relatórios e gráficos, incluindo consultas de quaisquer dados já cadastrados, encaminhe para o Data Analytics. Nesse caso, retorne apenas uma mensagem de confirmação, sem mais detalhes.
3 - Para otimizações de carregamento/descarregamento, encaminhe para o Otimizador.
Responda com apenas uma palavra: helper, data_analytics, optimizer ou direct."#;
