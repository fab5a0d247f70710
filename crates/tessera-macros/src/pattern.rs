use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use rustc_hash::FxHashMap;
use syn::{
    parenthesized,
    parse::{Parse, ParseStream},
    token, Expr, Ident, Lifetime, Lit, LitStr, Token,
};

mod keyword {
    syn::custom_keyword!(isa);
    syn::custom_keyword!(sub);
    syn::custom_keyword!(plays);
    syn::custom_keyword!(relates);
    syn::custom_keyword!(has);
    syn::custom_keyword!(via);
    syn::custom_keyword!(id);
    syn::custom_keyword!(contains);
}

/// Variables of one pattern. Each named variable is built once and cloned wherever it appears.
#[derive(Default)]
struct Variables {
    named: FxHashMap<String, Ident>,
    bindings: Vec<TokenStream>,
    anonymous: usize,
}

impl Variables {
    fn get(&mut self, variable: &Variable, crate_root: &Ident) -> TokenStream {
        match variable {
            Variable::Named(name) => {
                let binding = match self.named.get(name) {
                    Some(binding) => binding.clone(),
                    None => {
                        let binding = format_ident!("__variable_{}", self.named.len());

                        self.bindings.push(quote! {
                            let #binding = #crate_root::variable::Variable::named(#name);
                        });
                        self.named.insert(name.clone(), binding.clone());

                        binding
                    }
                };

                quote! { #binding.clone() }
            }
            Variable::Anonymous => self.fresh(crate_root),
        }
    }

    fn fresh(&mut self, crate_root: &Ident) -> TokenStream {
        let binding = format_ident!("__anonymous_{}", self.anonymous);
        self.anonymous += 1;

        self.bindings.push(quote! {
            let #binding = #crate_root::variable::Variable::anonymous();
        });

        quote! { #binding.clone() }
    }
}

#[derive(Clone)]
enum Variable {
    Named(String),
    Anonymous,
}

impl Parse for Variable {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let lifetime = input.parse::<Lifetime>()?;

        Ok(if lifetime.ident == "_" {
            Self::Anonymous
        } else {
            Self::Named(lifetime.ident.to_string())
        })
    }
}

struct Label(String);

impl Parse for Label {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            Ok(Self(input.parse::<LitStr>()?.value()))
        } else {
            Ok(Self(input.parse::<Ident>()?.to_string()))
        }
    }
}

fn construct_label(label: &Label, crate_root: &Ident) -> TokenStream {
    let label = &label.0;

    quote! { #crate_root::label::Label::new(#label) }
}

enum TypeRef {
    Label(Label),
    Variable(Variable),
}

impl TypeRef {
    fn construct(&self, crate_root: &Ident, variables: &mut Variables) -> TokenStream {
        match self {
            TypeRef::Label(label) => {
                let label = construct_label(label, crate_root);

                quote! { #crate_root::pattern::TypeRef::Label(#label) }
            }
            TypeRef::Variable(variable) => {
                let variable = variables.get(variable, crate_root);

                quote! { #crate_root::pattern::TypeRef::Var(#variable) }
            }
        }
    }
}

impl Parse for TypeRef {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(if input.peek(Lifetime) {
            Self::Variable(input.parse()?)
        } else {
            Self::Label(input.parse()?)
        })
    }
}

struct RolePlayer {
    role: Option<TypeRef>,
    player: Variable,
}

impl Parse for RolePlayer {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let role = if input.peek2(Token![:]) {
            let role = input.parse::<TypeRef>()?;
            let _ = input.parse::<Token![:]>()?;

            Some(role)
        } else {
            None
        };

        let player = input.parse::<Variable>()?;

        Ok(Self { role, player })
    }
}

enum Comparator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
}

impl Comparator {
    fn peek(input: ParseStream) -> bool {
        input.peek(Token![==])
            || input.peek(Token![!=])
            || input.peek(Token![>=])
            || input.peek(Token![<=])
            || input.peek(Token![>])
            || input.peek(Token![<])
            || input.peek(keyword::contains)
    }

    fn construct(&self, crate_root: &Ident) -> TokenStream {
        let variant = match self {
            Comparator::Eq => quote! { Eq },
            Comparator::Neq => quote! { Neq },
            Comparator::Gt => quote! { Gt },
            Comparator::Gte => quote! { Gte },
            Comparator::Lt => quote! { Lt },
            Comparator::Lte => quote! { Lte },
            Comparator::Contains => quote! { Contains },
        };

        quote! { #crate_root::predicate::Comparator::#variant }
    }
}

impl Parse for Comparator {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        // Two-character operators are peeked first, `>=` would otherwise parse as `>`.
        if input.peek(Token![==]) {
            let _ = input.parse::<Token![==]>()?;
            Ok(Self::Eq)
        } else if input.peek(Token![!=]) {
            let _ = input.parse::<Token![!=]>()?;
            Ok(Self::Neq)
        } else if input.peek(Token![>=]) {
            let _ = input.parse::<Token![>=]>()?;
            Ok(Self::Gte)
        } else if input.peek(Token![<=]) {
            let _ = input.parse::<Token![<=]>()?;
            Ok(Self::Lte)
        } else if input.peek(Token![>]) {
            let _ = input.parse::<Token![>]>()?;
            Ok(Self::Gt)
        } else if input.peek(Token![<]) {
            let _ = input.parse::<Token![<]>()?;
            Ok(Self::Lt)
        } else {
            let _ = input.parse::<keyword::contains>()?;
            Ok(Self::Contains)
        }
    }
}

struct Value {
    negative: bool,
    literal: Lit,
}

impl Value {
    fn construct(&self, crate_root: &Ident) -> syn::Result<TokenStream> {
        let literal = &self.literal;
        let sign = if self.negative {
            quote! { - }
        } else {
            quote! {}
        };

        Ok(match literal {
            Lit::Str(_) if !self.negative => {
                quote! { #crate_root::predicate::Literal::string(#literal) }
            }
            Lit::Bool(_) if !self.negative => {
                quote! { #crate_root::predicate::Literal::Boolean(#literal) }
            }
            Lit::Int(int) if int.suffix().is_empty() => {
                quote! { #crate_root::predicate::Literal::Long(#sign #literal) }
            }
            Lit::Float(float) if float.suffix().is_empty() => {
                quote! { #crate_root::predicate::Literal::Double(#sign #literal) }
            }
            _ => {
                return Err(syn::Error::new(
                    literal.span(),
                    "expected a string, an unsuffixed number or a boolean",
                ))
            }
        })
    }
}

impl Parse for Value {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let negative = input.peek(Token![-]);

        if negative {
            let _ = input.parse::<Token![-]>()?;
        }

        Ok(Self {
            negative,
            literal: input.parse()?,
        })
    }
}

struct ValueOperation {
    comparator: Comparator,
    value: Value,
}

impl ValueOperation {
    fn construct(&self, crate_root: &Ident) -> syn::Result<TokenStream> {
        let comparator = self.comparator.construct(crate_root);
        let value = self.value.construct(crate_root)?;

        Ok(quote! { #crate_root::predicate::ValueOperation::new(#comparator, #value) })
    }
}

impl Parse for ValueOperation {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(Self {
            comparator: input.parse()?,
            value: input.parse()?,
        })
    }
}

enum HasTarget {
    /// `has name`, ownership declared on a type.
    Type,
    Variable {
        attribute: Variable,
        relation: Option<Variable>,
    },
    /// `has name "Alice"`, or `has age > 30`, owning an unnamed attribute with that value.
    Value(ValueOperation),
}

enum Property {
    Isa { type_ref: TypeRef, direct: bool },
    Sub(TypeRef),
    Plays(TypeRef),
    Relates(TypeRef),
    Has { attribute_type: Label, target: HasTarget },
    Relation(Vec<RolePlayer>),
    Id(Expr),
    Type(Label),
    Value(ValueOperation),
}

impl Property {
    /// Builds the property, along with any statement it implies about another variable.
    fn construct(
        &self,
        crate_root: &Ident,
        variables: &mut Variables,
        implied: &mut Vec<TokenStream>,
    ) -> syn::Result<TokenStream> {
        let property = quote! { #crate_root::pattern::Property };

        Ok(match self {
            Property::Isa { type_ref, direct } => {
                let type_ref = type_ref.construct(crate_root, variables);

                quote! { #property::Isa { type_ref: #type_ref, direct: #direct } }
            }
            Property::Sub(type_ref) => {
                let type_ref = type_ref.construct(crate_root, variables);

                quote! { #property::Sub(#type_ref) }
            }
            Property::Plays(type_ref) => {
                let type_ref = type_ref.construct(crate_root, variables);

                quote! { #property::Plays(#type_ref) }
            }
            Property::Relates(type_ref) => {
                let type_ref = type_ref.construct(crate_root, variables);

                quote! { #property::Relates(#type_ref) }
            }
            Property::Has {
                attribute_type,
                target,
            } => {
                let label = construct_label(attribute_type, crate_root);

                match target {
                    HasTarget::Type => {
                        quote! { #property::HasType(#crate_root::pattern::TypeRef::Label(#label)) }
                    }
                    HasTarget::Variable {
                        attribute,
                        relation,
                    } => {
                        let attribute = variables.get(attribute, crate_root);
                        let relation = match relation {
                            Some(relation) => {
                                let relation = variables.get(relation, crate_root);

                                quote! { Some(#relation) }
                            }
                            None => quote! { None },
                        };

                        quote! {
                            #property::Has {
                                attribute_type: #label,
                                attribute: #attribute,
                                relation: #relation,
                            }
                        }
                    }
                    HasTarget::Value(operation) => {
                        let attribute = variables.fresh(crate_root);
                        let operation = operation.construct(crate_root)?;

                        implied.push(quote! {
                            #crate_root::pattern::Statement::new(
                                #attribute,
                                vec![#property::Value(#operation)],
                            )
                        });

                        quote! {
                            #property::Has {
                                attribute_type: #label,
                                attribute: #attribute,
                                relation: None,
                            }
                        }
                    }
                }
            }
            Property::Relation(role_players) => {
                let role_players = role_players
                    .iter()
                    .map(|RolePlayer { role, player }| {
                        let role = match role {
                            Some(role) => {
                                let role = role.construct(crate_root, variables);

                                quote! { Some(#role) }
                            }
                            None => quote! { None },
                        };
                        let player = variables.get(player, crate_root);

                        quote! { #crate_root::pattern::RolePlayer::new(#role, #player) }
                    })
                    .collect::<Vec<_>>();

                quote! { #property::Relation(vec![#(#role_players),*]) }
            }
            Property::Id(id) => quote! { #property::Id(#id) },
            Property::Type(label) => {
                let label = construct_label(label, crate_root);

                quote! { #property::Type(#label) }
            }
            Property::Value(operation) => {
                let operation = operation.construct(crate_root)?;

                quote! { #property::Value(#operation) }
            }
        })
    }
}

impl Parse for Property {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(keyword::isa) {
            let _ = input.parse::<keyword::isa>()?;
            let direct = input.peek(Token![!]);

            if direct {
                let _ = input.parse::<Token![!]>()?;
            }

            Ok(Self::Isa {
                type_ref: input.parse()?,
                direct,
            })
        } else if input.peek(keyword::sub) {
            let _ = input.parse::<keyword::sub>()?;

            Ok(Self::Sub(input.parse()?))
        } else if input.peek(keyword::plays) {
            let _ = input.parse::<keyword::plays>()?;

            Ok(Self::Plays(input.parse()?))
        } else if input.peek(keyword::relates) {
            let _ = input.parse::<keyword::relates>()?;

            Ok(Self::Relates(input.parse()?))
        } else if input.peek(keyword::has) {
            let _ = input.parse::<keyword::has>()?;
            let attribute_type = input.parse::<Label>()?;

            let target = if input.peek(Lifetime) {
                let attribute = input.parse::<Variable>()?;
                let relation = if input.peek(keyword::via) {
                    let _ = input.parse::<keyword::via>()?;

                    Some(input.parse::<Variable>()?)
                } else {
                    None
                };

                HasTarget::Variable {
                    attribute,
                    relation,
                }
            } else if Comparator::peek(input) {
                HasTarget::Value(input.parse()?)
            } else if input.peek(Lit) || input.peek(Token![-]) {
                HasTarget::Value(ValueOperation {
                    comparator: Comparator::Eq,
                    value: input.parse()?,
                })
            } else {
                HasTarget::Type
            };

            Ok(Self::Has {
                attribute_type,
                target,
            })
        } else if input.peek(token::Paren) {
            let content;
            parenthesized!(content in input);

            let role_players = content
                .parse_terminated(RolePlayer::parse, Token![,])?
                .into_iter()
                .collect();

            Ok(Self::Relation(role_players))
        } else if input.peek(keyword::id) {
            let _ = input.parse::<keyword::id>()?;

            Ok(Self::Id(input.parse()?))
        } else if input.peek(Token![type]) {
            let _ = input.parse::<Token![type]>()?;

            Ok(Self::Type(input.parse()?))
        } else if Comparator::peek(input) {
            Ok(Self::Value(input.parse()?))
        } else {
            Err(input.error("expected a property"))
        }
    }
}

struct Statement {
    variable: Variable,
    properties: Vec<Property>,
}

impl Parse for Statement {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        // A statement opening with a relation, `(a: 'x, b: 'y) isa t`, has an unnamed owner.
        let variable = if input.peek(token::Paren) {
            Variable::Anonymous
        } else {
            input.parse()?
        };

        let mut properties = vec![input.parse::<Property>()?];

        // A relation may be followed by its other properties without a comma.
        while !input.is_empty() && !input.peek(Token![;]) {
            if input.peek(Token![,]) {
                let _ = input.parse::<Token![,]>()?;
            }

            properties.push(input.parse()?);
        }

        Ok(Self {
            variable,
            properties,
        })
    }
}

pub(crate) struct Pattern {
    statements: Vec<Statement>,
}

impl Pattern {
    pub(crate) fn construct(&self, crate_root: &Ident) -> TokenStream {
        let mut variables = Variables::default();
        let mut statements = Vec::new();

        for Statement {
            variable,
            properties,
        } in &self.statements
        {
            let variable = variables.get(variable, crate_root);
            let mut implied = Vec::new();

            let properties = match properties
                .iter()
                .map(|property| property.construct(crate_root, &mut variables, &mut implied))
                .collect::<syn::Result<Vec<_>>>()
            {
                Ok(properties) => properties,
                Err(error) => return error.to_compile_error(),
            };

            statements.push(quote! {
                #crate_root::pattern::Statement::new(#variable, vec![#(#properties),*])
            });
            statements.extend(implied);
        }

        let bindings = &variables.bindings;

        quote! {
            {
                #(#bindings)*

                #crate_root::pattern::Conjunction::new(vec![#(#statements),*])
            }
        }
    }
}

impl Parse for Pattern {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let statements = input
            .parse_terminated(Statement::parse, Token![;])?
            .into_iter()
            .collect();

        Ok(Self { statements })
    }
}
